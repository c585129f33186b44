#![no_main]

use foldstat::results::{derive_metrics, FoldResult, ResultFileFormat};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(input) = std::str::from_utf8(data) {
        // Neither layout may panic, and metrics must be derivable from anything that parses
        for format in [ResultFileFormat::Legacy, ResultFileFormat::Current] {
            if let Ok(result) = FoldResult::parse(input, format) {
                let _ = derive_metrics(&result.predictions);
                let _ = result.parameters(3);
                let _ = result.predictions_to_csv();
            }
        }
    }
});
