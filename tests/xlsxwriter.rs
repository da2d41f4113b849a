// SPDX-License-Identifier: MIT
//
// Copyright 2016-2025, Johann Tuffe.

//! Workbooks written by another library

use std::io::Cursor;

use rust_xlsxwriter::{Color as WriterColor, Format, Workbook};
use xlstream::{serial_to_timestamp, Color, Data, Key, ResultMode, ValueType, Xlsx};

fn workbook() -> Xlsx<Cursor<Vec<u8>>> {
    let mut workbook = Workbook::new();
    let date = Format::new().set_num_format("yyyy-mm-dd");
    let warn = Format::new()
        .set_bold()
        .set_font_color(WriterColor::Red)
        .set_background_color(WriterColor::Yellow);

    let sheet = workbook.add_worksheet();
    sheet.set_name("Orders").unwrap();
    for (col, title) in ["item", "qty", "shipped", "done", "total"].iter().enumerate() {
        sheet.write_string(0, col as u16, *title).unwrap();
    }
    let orders = [("pen", 3., 45000., true), ("ink", 12., 45001.5, false)];
    for (i, (item, qty, shipped, done)) in orders.iter().enumerate() {
        let row = i as u32 + 1;
        sheet.write_string(row, 0, *item).unwrap();
        sheet.write_number(row, 1, *qty).unwrap();
        sheet.write_number_with_format(row, 2, *shipped, &date).unwrap();
        sheet.write_boolean(row, 3, *done).unwrap();
        sheet
            .write_formula(row, 4, format!("=B{}*2", row + 1).as_str())
            .unwrap();
    }
    sheet.write_string_with_format(4, 0, "late", &warn).unwrap();

    let other = workbook.add_worksheet();
    other.set_name("Empty").unwrap();

    let buf = workbook.save_to_buffer().unwrap();
    Xlsx::new(Cursor::new(buf)).unwrap()
}

#[test]
fn reads_written_workbook() {
    let mut wb = workbook();
    assert_eq!(wb.sheet_names(), vec!["Orders", "Empty"]);
    wb.select_sheet("Orders").unwrap();

    let rows = wb
        .read_rows(ResultMode::new().with_first_row(true))
        .unwrap();
    assert_eq!(rows.len(), 3);
    let pen = &rows[0];
    assert_eq!(pen.key(), &Key::Num(2));
    assert_eq!(pen.get("item"), Some(&Data::String("pen".to_string())));
    assert_eq!(pen.get("qty"), Some(&Data::Int(3)));
    assert_eq!(
        pen.get("shipped"),
        Some(&Data::Timestamp(serial_to_timestamp(45000., false).unwrap()))
    );
    assert_eq!(pen.get("done"), Some(&Data::Bool(true)));
    assert_eq!(pen.cell("total").and_then(|c| c.formula()), Some("=B2*2"));
    assert_eq!(pen.cell("shipped").map(|c| c.value_type()), Some(ValueType::Date));

    let ink = &rows[1];
    assert_eq!(ink.get("done"), Some(&Data::Bool(false)));
    assert_eq!(
        ink.get("shipped"),
        Some(&Data::Timestamp(serial_to_timestamp(45001.5, false).unwrap()))
    );

    wb.set_date_format("%d/%m/%Y");
    let cells = wb.read_cells().unwrap();
    assert_eq!(cells["C2"], Data::String("15/03/2023".to_string()));
}

#[test]
fn written_styles() {
    let mut wb = workbook();
    wb.select_sheet("Orders").unwrap();
    let cells = wb.read_cells_with_styles().unwrap();
    let late = &cells["A5"];
    let style = wb.styles().complete_style(late.style());
    let font = style.font.as_ref().unwrap();
    assert!(font.bold);
    assert_eq!(font.color.and_then(|c| c.to_hex()).as_deref(), Some("#FF0000"));
    let fill = style.fill.as_ref().unwrap();
    assert_eq!(fill.fg_color, Some(Color::Argb(0xFFFF_FF00)));
}

#[test]
fn written_dimensions() {
    let mut wb = workbook();
    wb.select_sheet("Orders").unwrap();
    let declared = wb.dimension().unwrap().unwrap();
    let actual = wb.actual_dimension().unwrap().unwrap();
    assert_eq!(declared, actual);
    assert_eq!((actual.rows(), actual.cols()), (5, 5));

    wb.select_sheet("Empty").unwrap();
    assert_eq!(wb.actual_dimension().unwrap(), None);
    assert!(wb.read_rows(ResultMode::new()).unwrap().is_empty());
}
