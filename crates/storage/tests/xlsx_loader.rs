use std::path::Path;

use quiz_core::model::QuestionKind;
use rust_xlsxwriter::Workbook;
use storage::question_source::{DataFormatError, QuestionSource, UploadError, load_questions};

const HEADER: [&str; 8] = [
    "type", "question", "option1", "option2", "option3", "option4", "answer", "image_url",
];

fn write_workbook(path: &Path, rows: &[[&str; 8]]) {
    let mut workbook = Workbook::new();
    {
        let sheet = workbook.add_worksheet();
        for (c, name) in HEADER.iter().enumerate() {
            sheet.write_string(0, c as u16, *name).unwrap();
        }
        for (r, row) in rows.iter().enumerate() {
            for (c, value) in row.iter().enumerate() {
                if value.is_empty() {
                    continue;
                }
                sheet.write_string(r as u32 + 1, c as u16, *value).unwrap();
            }
        }
    }
    workbook.save(path).unwrap();
}

fn sample_rows() -> Vec<[&'static str; 8]> {
    vec![
        ["text", "2+2?", "3", "4", "5", "6", "4", ""],
        ["image", "Which flag?", "France", "Italy", "Chad", "Peru", "France", "img/fr.png"],
        ["text_image", "Who painted this?", "Monet", "Manet", "Degas", "Renoir", "Monet", "img/p.png"],
        ["text", "Capital of France?", "Lyon", " Paris ", "Nice", "Lille", "paris", ""],
    ]
}

#[test]
fn loads_every_row_in_file_order() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("questions.xlsx");
    write_workbook(&path, &sample_rows());

    let questions = load_questions(&path).unwrap();

    assert_eq!(questions.len(), 4);
    let prompts: Vec<_> = questions.iter().map(|q| q.prompt()).collect();
    assert_eq!(
        prompts,
        ["2+2?", "Which flag?", "Who painted this?", "Capital of France?"]
    );
    assert_eq!(questions[1].kind(), &QuestionKind::Image);
    assert_eq!(questions[2].image_ref(), Some("img/p.png"));
    assert_eq!(questions[0].image_ref(), None);
    assert_eq!(questions[3].option(1), Some(" Paris "));
}

#[test]
fn numeric_cells_read_as_integer_text() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("questions.xlsx");

    let mut workbook = Workbook::new();
    {
        let sheet = workbook.add_worksheet();
        for (c, name) in HEADER.iter().take(7).enumerate() {
            sheet.write_string(0, c as u16, *name).unwrap();
        }
        sheet.write_string(1, 0, "text").unwrap();
        sheet.write_string(1, 1, "2+2?").unwrap();
        for (c, n) in [3.0, 4.0, 5.0, 6.0, 4.0].iter().enumerate() {
            sheet.write_number(1, c as u16 + 2, *n).unwrap();
        }
    }
    workbook.save(&path).unwrap();

    let questions = load_questions(&path).unwrap();
    assert_eq!(questions[0].options()[1], "4");
    assert_eq!(questions[0].correct_answer(), "4");
}

#[test]
fn malformed_row_fails_whole_load() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("questions.xlsx");
    write_workbook(
        &path,
        &[
            ["text", "2+2?", "3", "4", "5", "6", "4", ""],
            ["image", "Which flag?", "a", "b", "c", "d", "a", ""],
        ],
    );

    let err = load_questions(&path).unwrap_err();
    assert!(matches!(err, DataFormatError::InvalidRow { row: 3, .. }));
}

#[test]
fn upload_replaces_canonical_file() {
    let dir = tempfile::tempdir().unwrap();
    let staging = tempfile::tempdir().unwrap();
    let source = QuestionSource::new(dir.path().join("uploads"));
    assert!(source.load().unwrap().is_empty());

    let upload = staging.path().join("mine.xlsx");
    write_workbook(&upload, &sample_rows());
    let bytes = std::fs::read(&upload).unwrap();

    let count = source.replace("My Questions.XLSX", &bytes).unwrap();

    assert_eq!(count, 4);
    assert_eq!(source.load().unwrap().len(), 4);
    assert!(source.path().ends_with("questions.xlsx"));
}

#[test]
fn rejected_upload_keeps_previous_file() {
    let dir = tempfile::tempdir().unwrap();
    let staging = tempfile::tempdir().unwrap();
    let source = QuestionSource::new(dir.path());
    write_workbook(&source.path(), &sample_rows());

    let wrong_type = source.replace("questions.csv", b"type,question\n");
    assert!(matches!(wrong_type, Err(UploadError::InvalidFileType { .. })));

    let bad = staging.path().join("bad.xlsx");
    write_workbook(&bad, &[["image", "No url", "a", "b", "c", "d", "a", ""]]);
    let bad_bytes = std::fs::read(&bad).unwrap();
    let malformed = source.replace("questions.xlsx", &bad_bytes);
    assert!(matches!(malformed, Err(UploadError::DataFormat(_))));

    assert_eq!(source.load().unwrap().len(), 4);
}
