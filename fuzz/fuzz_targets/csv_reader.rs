#![no_main]
use gtfs_kit_core::{CsvReader, FieldAccessor};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(mut reader) = CsvReader::new(data) else {
        return;
    };
    while let Ok(Some(record)) = reader.next_record() {
        let row = FieldAccessor::new(reader.header(), &record);
        let _ = row.time("arrival_time");
        let _ = row.optional_double("shape_dist_traveled");
        let _ = row.ranged_integer("stop_sequence", 0, u32::MAX as i64);
    }
});
