//! Fuzz target: `JpegImageCodec::decode`
//!
//! Arbitrary blobs either decode to an image whose pixel buffer matches its
//! dimensions or fail with a typed error.
//!
//! cargo fuzz run fuzz_image_blob

#![no_main]

use libfuzzer_sys::fuzz_target;
use phoneiot::adapters::image_codec::JpegImageCodec;
use phoneiot::app::ports::ImageCodec;

fuzz_target!(|data: &[u8]| {
    if let Ok(image) = JpegImageCodec.decode(data) {
        assert_eq!(image.pixels().len(), image.raw_size());
        assert!(image.width() > 0 && image.height() > 0);
    }
});
