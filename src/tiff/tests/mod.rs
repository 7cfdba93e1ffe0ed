mod test_utils;
mod volume_codec_tests;
