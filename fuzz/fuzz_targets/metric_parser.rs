#![no_main]

use libfuzzer_sys::fuzz_target;
use pairbench::runner::MetricExtractor;

fuzz_target!(|data: &[u8]| {
    // Arbitrary child output must never panic the extractor
    if let Ok(extractor) = MetricExtractor::new() {
        let _ = extractor.extract(data);
    }
});
