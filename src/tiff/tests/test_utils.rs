use std::io::Cursor;
use byteorder::{BigEndian, WriteBytesExt};

/// Options for the hand-built big-endian fixture
pub struct FixtureOptions {
    pub width: u32,
    pub height: u32,
    pub rows_per_strip: u32,
    pub horizontal_predictor: bool,
}

/// Builds a big-endian ("MM") multi-page TIFF of unsigned 16-bit samples
///
/// Each page is `width * height` values in row order. Strip data comes
/// first, then the out-of-line strip tables, then the IFD chain, so every
/// offset is known before the IFDs are written.
pub fn create_big_endian_u16_volume(pages: &[Vec<u16>], options: &FixtureOptions) -> Cursor<Vec<u8>> {
    let width = options.width as usize;
    let rows_per_strip = options.rows_per_strip as usize;
    let strips_per_page = (options.height as usize + rows_per_strip - 1) / rows_per_strip;

    let mut buffer = Vec::new();
    buffer.write_u16::<BigEndian>(0x4D4D).unwrap(); // MM for big-endian
    buffer.write_u16::<BigEndian>(42).unwrap();     // TIFF magic number
    buffer.write_u32::<BigEndian>(0).unwrap();      // First IFD offset, patched below

    // Strip data
    let mut strip_tables = Vec::new();
    for page in pages {
        let mut offsets = Vec::new();
        let mut counts = Vec::new();
        for rows in page.chunks(width * rows_per_strip) {
            offsets.push(buffer.len() as u32);
            for row in rows.chunks(width) {
                let mut previous = 0u16;
                for (i, &value) in row.iter().enumerate() {
                    let stored = if options.horizontal_predictor && i > 0 {
                        value.wrapping_sub(previous)
                    } else {
                        value
                    };
                    buffer.write_u16::<BigEndian>(stored).unwrap();
                    previous = value;
                }
            }
            counts.push((rows.len() * 2) as u32);
        }
        strip_tables.push((offsets, counts));
    }

    // Strip tables that do not fit in an entry
    let mut table_offsets = Vec::new();
    for (offsets, counts) in &strip_tables {
        if strips_per_page > 1 {
            let offsets_at = buffer.len() as u32;
            for &o in offsets {
                buffer.write_u32::<BigEndian>(o).unwrap();
            }
            let counts_at = buffer.len() as u32;
            for &c in counts {
                buffer.write_u32::<BigEndian>(c).unwrap();
            }
            table_offsets.push((offsets_at, counts_at));
        } else {
            table_offsets.push((offsets[0], counts[0]));
        }
    }

    // IFD chain
    let entry_count: u16 = if options.horizontal_predictor { 11 } else { 10 };
    let ifd_size = 2 + 12 * entry_count as usize + 4;
    let first_ifd = buffer.len();
    (&mut buffer[4..8]).write_u32::<BigEndian>(first_ifd as u32).unwrap();

    for (index, &(offsets_value, counts_value)) in table_offsets.iter().enumerate() {
        let next = if index + 1 < pages.len() { (first_ifd + (index + 1) * ifd_size) as u32 } else { 0 };
        let strips = strips_per_page as u32;

        buffer.write_u16::<BigEndian>(entry_count).unwrap();
        write_long(&mut buffer, 256, 1, options.width);
        write_long(&mut buffer, 257, 1, options.height);
        write_short(&mut buffer, 258, 16);
        write_short(&mut buffer, 259, 1);
        write_short(&mut buffer, 262, 1);
        write_long(&mut buffer, 273, strips, offsets_value);
        write_short(&mut buffer, 277, 1);
        write_long(&mut buffer, 278, 1, options.rows_per_strip);
        write_long(&mut buffer, 279, strips, counts_value);
        if options.horizontal_predictor {
            write_short(&mut buffer, 317, 2);
        }
        write_short(&mut buffer, 339, 1);
        buffer.write_u32::<BigEndian>(next).unwrap();
    }

    Cursor::new(buffer)
}

fn write_short(buffer: &mut Vec<u8>, tag: u16, value: u16) {
    buffer.write_u16::<BigEndian>(tag).unwrap();
    buffer.write_u16::<BigEndian>(3).unwrap();      // Type (SHORT)
    buffer.write_u32::<BigEndian>(1).unwrap();      // Count
    buffer.write_u16::<BigEndian>(value).unwrap();  // Value, left-justified
    buffer.write_u16::<BigEndian>(0).unwrap();
}

fn write_long(buffer: &mut Vec<u8>, tag: u16, count: u32, value: u32) {
    buffer.write_u16::<BigEndian>(tag).unwrap();
    buffer.write_u16::<BigEndian>(4).unwrap();      // Type (LONG)
    buffer.write_u32::<BigEndian>(count).unwrap();
    buffer.write_u32::<BigEndian>(value).unwrap();  // Value or offset
}

/// Page `z` of a deterministic test pattern
pub fn pattern_page(z: usize, width: usize, height: usize) -> Vec<u16> {
    (0..width * height)
        .map(|i| (z * 1000 + i * 7) as u16)
        .collect()
}
