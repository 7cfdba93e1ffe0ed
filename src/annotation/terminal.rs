//! Line-oriented annotation surface
//!
//! Reads one command per line and prints the session's state back. Slice
//! coordinates are typed instead of clicked; `render` writes the current
//! view as a PNG for inspection.
//!
//! ```text
//! click <x> <y>          place the unconfirmed point
//! confirm | right <x> <y>  label it (prompts for a tag, empty cancels)
//! zoom <delta> <x> <y>   zoom in (positive) or out around a position
//! reset                  restore the initial view
//! line                   start a new line
//! undo                   remove the last annotation
//! save                   write the store
//! load <path>            open another volume
//! render <path>          write the current view as PNG
//! list                   print all annotations
//! quit
//! ```

use std::io::{BufRead, Write};
use std::path::PathBuf;

use log::debug;

use super::controller::{AnnotationSurface, SurfaceEvent};
use super::store::Annotation;
use super::viewport::Viewport;

const HELP: &str = "Commands: click X Y, confirm, right X Y, zoom D X Y, reset, line, undo, save, \
                    load PATH, render PATH, list, help, quit";

/// Surface over any line reader and writer, normally stdin and stdout
pub struct TerminalSurface<R: BufRead, W: Write> {
    input: R,
    output: W,
    last_annotations: Vec<Annotation>,
}

impl<R: BufRead, W: Write> TerminalSurface<R, W> {
    pub fn new(input: R, output: W) -> Self {
        TerminalSurface {
            input,
            output,
            last_annotations: Vec::new(),
        }
    }

    pub fn into_output(self) -> W {
        self.output
    }

    fn read_line(&mut self) -> Option<String> {
        let mut line = String::new();
        match self.input.read_line(&mut line) {
            Ok(0) | Err(_) => None,
            Ok(_) => Some(line.trim_end_matches(['\r', '\n']).to_string()),
        }
    }

    fn say(&mut self, text: &str) {
        // Output failures only lose display text; the session state is unaffected
        let _ = writeln!(self.output, "{}", text);
        let _ = self.output.flush();
    }

    fn list(&mut self) {
        if self.last_annotations.is_empty() {
            self.say("No annotations.");
            return;
        }
        let lines: Vec<String> = self.last_annotations.iter()
            .map(|a| format!("  {} {}", a.point, a.label))
            .collect();
        for line in lines {
            self.say(&line);
        }
    }
}

/// Parses one command line; `Err` carries a message for the operator
pub fn parse_command(line: &str) -> Result<Option<SurfaceEvent>, String> {
    let mut words = line.split_whitespace();
    let Some(command) = words.next() else {
        return Ok(None);
    };
    let args: Vec<&str> = words.collect();

    let number = |index: usize| -> Result<f64, String> {
        args.get(index)
            .ok_or_else(|| format!("'{}' needs more arguments", command))?
            .parse::<f64>()
            .ok()
            .filter(|value| value.is_finite())
            .ok_or_else(|| format!("'{}' is not a number", args[index]))
    };
    let path = || -> Result<PathBuf, String> {
        if args.is_empty() {
            Err(format!("'{}' needs a path", command))
        } else {
            Ok(PathBuf::from(args.join(" ")))
        }
    };

    let event = match command.to_lowercase().as_str() {
        "click" | "c" => SurfaceEvent::PrimaryClick { x: number(0)?, y: number(1)? },
        "right" => SurfaceEvent::SecondaryClick { x: number(0)?, y: number(1)? },
        "confirm" | "enter" | "ok" => SurfaceEvent::Confirm,
        "zoom" | "scroll" => SurfaceEvent::Scroll {
            delta: number(0)? as i32,
            x: number(1)?,
            y: number(2)?,
        },
        "reset" | "r" => SurfaceEvent::ResetView,
        "line" | "n" => SurfaceEvent::NewLine,
        "undo" | "u" => SurfaceEvent::Undo,
        "save" | "s" => SurfaceEvent::Save,
        "load" => SurfaceEvent::Load(path()?),
        "render" => SurfaceEvent::Render(path()?),
        "quit" | "q" | "exit" => SurfaceEvent::Quit,
        other => return Err(format!("Unknown command '{}'", other)),
    };
    Ok(Some(event))
}

impl<R: BufRead, W: Write> AnnotationSurface for TerminalSurface<R, W> {
    fn next_event(&mut self) -> Option<SurfaceEvent> {
        loop {
            let line = self.read_line()?;
            match line.trim() {
                "help" | "?" => self.say(HELP),
                "list" | "l" => self.list(),
                _ => match parse_command(&line) {
                    Ok(Some(event)) => return Some(event),
                    Ok(None) => {}
                    Err(message) => self.say(&message),
                },
            }
        }
    }

    fn prompt_tag(&mut self, line: u32, column: u32) -> Option<String> {
        let _ = write!(self.output, "Tag for L{}_C{}: ", line, column);
        let _ = self.output.flush();
        let tag = self.read_line()?;
        debug!("Tag entered: {:?}", tag);
        Some(tag)
    }

    fn redraw(&mut self, annotations: &[Annotation], pending: Option<(i64, i64)>, viewport: &Viewport) {
        self.last_annotations = annotations.to_vec();
        let view = viewport.current();
        let pending = match pending {
            Some((x, y)) => format!("pending ({}, {})", x, y),
            None => "no pending point".to_string(),
        };
        self.say(&format!(
            "[{} annotations, {}, view x {:.1}..{:.1} y {:.1}..{:.1}]",
            annotations.len(), pending, view.x_min, view.x_max, view.y_min, view.y_max));
    }

    fn status(&mut self, text: &str) {
        self.say(text);
    }

    fn alert(&mut self, title: &str, message: &str) {
        self.say(&format!("{}: {}", title, message));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn commands_parse() {
        assert_eq!(parse_command("click 3 4.5").unwrap(), Some(SurfaceEvent::PrimaryClick { x: 3.0, y: 4.5 }));
        assert_eq!(parse_command("zoom -1 10 20").unwrap(),
                   Some(SurfaceEvent::Scroll { delta: -1, x: 10.0, y: 20.0 }));
        assert_eq!(parse_command("load /tmp/my cube.tif").unwrap(),
                   Some(SurfaceEvent::Load(PathBuf::from("/tmp/my cube.tif"))));
        assert_eq!(parse_command("   ").unwrap(), None);
        assert!(parse_command("click 3").is_err());
        assert!(parse_command("click x 3").is_err());
        assert!(parse_command("paint").is_err());
        assert!(parse_command("click NaN NaN").is_err());
        assert!(parse_command("click inf 3").is_err());
        assert!(parse_command("zoom 1 -inf 0").is_err());
    }

    #[test]
    fn bad_lines_are_reported_and_skipped() {
        let input = Cursor::new("bogus\nhelp\nundo\n");
        let mut surface = TerminalSurface::new(input, Vec::new());

        assert_eq!(surface.next_event(), Some(SurfaceEvent::Undo));
        assert_eq!(surface.next_event(), None);

        let output = String::from_utf8(surface.into_output()).unwrap();
        assert!(output.contains("Unknown command 'bogus'"));
        assert!(output.contains("Commands:"));
    }

    #[test]
    fn tag_prompt_reads_next_line() {
        let mut surface = TerminalSurface::new(Cursor::new("  nucleus \r\n \n"), Vec::new());
        assert_eq!(surface.prompt_tag(2, 3), Some("  nucleus ".to_string()));
        assert_eq!(surface.prompt_tag(2, 4), Some(" ".to_string()));
        assert_eq!(surface.prompt_tag(2, 5), None);

        let output = String::from_utf8(surface.into_output()).unwrap();
        assert!(output.starts_with("Tag for L2_C3: "));
    }
}
