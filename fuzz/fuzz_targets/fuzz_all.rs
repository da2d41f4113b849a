#![no_main]
use libfuzzer_sys::fuzz_target;
use std::io::Cursor;
use xlstream::{ResultMode, Xlsx};

fuzz_target!(|data: &[u8]| {
    let mut workbook = match Xlsx::new(Cursor::new(data.to_vec())) {
        Ok(excel) => excel,
        Err(_) => return,
    };
    let ids: Vec<u32> = workbook.sheets().iter().map(|s| s.id).collect();
    for id in ids {
        if workbook.select_sheet_by_id(id).is_err() {
            continue;
        }
        let _ = workbook.dimension();
        let _ = workbook.actual_dimension();
        if let Ok(rows) = workbook.rows(ResultMode::new().with_first_row(true)) {
            rows.take_while(Result::is_ok).count();
        }
        for i in 0..workbook.styles().len() {
            let _ = workbook.styles().complete_style(i);
        }
    }
});
