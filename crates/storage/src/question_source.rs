//! Reading question sets from spreadsheets and replacing the canonical file on upload.

use std::io::Write;
use std::path::{Path, PathBuf};

use calamine::{Data, Reader, Xlsx, XlsxError, open_workbook};
use quiz_core::model::{OPTION_COUNT, Question, QuestionError, QuestionKind};
use thiserror::Error;

/// Name of the canonical question file inside the upload directory.
pub const QUESTIONS_FILE_NAME: &str = "questions.xlsx";

/// Extensions accepted for uploads (compared case-insensitively).
pub const ALLOWED_EXTENSIONS: &[&str] = &["xlsx"];

const COL_TYPE: &str = "type";
const COL_QUESTION: &str = "question";
const COL_OPTIONS: [&str; OPTION_COUNT] = ["option1", "option2", "option3", "option4"];
const COL_ANSWER: &str = "answer";
const COL_IMAGE_URL: &str = "image_url";

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

/// The question file could not be turned into questions. Fatal to the whole load.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum DataFormatError {
    #[error("could not read workbook: {0}")]
    Workbook(String),

    #[error("workbook has no worksheets")]
    NoWorksheet,

    #[error("missing required column `{column}`")]
    MissingColumn { column: &'static str },

    #[error("row {row}: missing value for `{column}`")]
    MissingValue { row: usize, column: &'static str },

    #[error("row {row}, column {column}: cell contains an error value")]
    CellError { row: usize, column: usize },

    #[error("row {row}: {source}")]
    InvalidRow {
        row: usize,
        #[source]
        source: QuestionError,
    },
}

/// Rejected upload. The previous question file stays in effect.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum UploadError {
    #[error("no file selected")]
    NoFileSelected,

    #[error("invalid file format `{filename}`: please upload an Excel (.xlsx) file")]
    InvalidFileType { filename: String },

    #[error(transparent)]
    DataFormat(#[from] DataFormatError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Whether `filename` carries one of the [`ALLOWED_EXTENSIONS`].
#[must_use]
pub fn allowed_file(filename: &str) -> bool {
    filename
        .rsplit_once('.')
        .is_some_and(|(_, ext)| {
            ALLOWED_EXTENSIONS
                .iter()
                .any(|allowed| ext.eq_ignore_ascii_case(allowed))
        })
}

//
// ─── TABLE → QUESTIONS ─────────────────────────────────────────────────────────
//

/// A worksheet reduced to text cells.
///
/// `rows[0]` is the header row; `first_row` is its 1-based row number in the
/// sheet, used for error messages.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Table {
    pub first_row: usize,
    pub rows: Vec<Vec<String>>,
}

struct Columns {
    kind: usize,
    question: usize,
    options: [usize; OPTION_COUNT],
    answer: usize,
    image_url: Option<usize>,
}

impl Columns {
    fn resolve(header: &[String]) -> Result<Self, DataFormatError> {
        let find = |name: &'static str| {
            header
                .iter()
                .position(|h| h.trim().eq_ignore_ascii_case(name))
        };
        let require =
            |name: &'static str| find(name).ok_or(DataFormatError::MissingColumn { column: name });

        let mut options = [0; OPTION_COUNT];
        for (slot, name) in options.iter_mut().zip(COL_OPTIONS) {
            *slot = require(name)?;
        }

        Ok(Self {
            kind: require(COL_TYPE)?,
            question: require(COL_QUESTION)?,
            options,
            answer: require(COL_ANSWER)?,
            image_url: find(COL_IMAGE_URL),
        })
    }
}

fn cell(row: &[String], idx: usize) -> &str {
    row.get(idx).map_or("", String::as_str)
}

impl Table {
    /// Convert every non-blank data row into a `Question`, in sheet order.
    ///
    /// A table with no rows at all is an empty question set.
    ///
    /// # Errors
    ///
    /// Returns `DataFormatError` for the first missing column or malformed row.
    pub fn questions(&self) -> Result<Vec<Question>, DataFormatError> {
        let Some((header, data)) = self.rows.split_first() else {
            return Ok(Vec::new());
        };
        let columns = Columns::resolve(header)?;

        let mut questions = Vec::with_capacity(data.len());
        for (offset, row) in data.iter().enumerate() {
            // trailing formatted-but-empty rows are common in exported sheets
            if row.iter().all(|c| c.trim().is_empty()) {
                continue;
            }
            let row_number = self.first_row + offset + 1;

            let raw_kind = cell(row, columns.kind);
            if raw_kind.trim().is_empty() {
                return Err(DataFormatError::MissingValue {
                    row: row_number,
                    column: COL_TYPE,
                });
            }
            let kind = QuestionKind::parse(raw_kind);
            let image_ref = if kind.requires_image() {
                columns.image_url.map(|idx| cell(row, idx).to_owned())
            } else {
                None
            };

            let question = Question::new(
                kind,
                cell(row, columns.question),
                columns.options.map(|idx| cell(row, idx).to_owned()),
                cell(row, columns.answer),
                image_ref,
            )
            .map_err(|source| DataFormatError::InvalidRow {
                row: row_number,
                source,
            })?;
            questions.push(question);
        }

        Ok(questions)
    }
}

//
// ─── WORKBOOK ──────────────────────────────────────────────────────────────────
//

fn format_float(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        #[allow(clippy::cast_possible_truncation)]
        let whole = value as i64;
        whole.to_string()
    } else {
        value.to_string()
    }
}

fn cell_text(data: &Data) -> Option<String> {
    let text = match data {
        Data::Empty => String::new(),
        Data::Error(_) => return None,
        Data::Int(i) => i.to_string(),
        Data::Float(f) => format_float(*f),
        other => other.to_string(),
    };
    Some(text)
}

/// Read the first worksheet of an `.xlsx` file into a [`Table`].
///
/// # Errors
///
/// Returns `DataFormatError` if the workbook cannot be opened or a cell holds an error value.
pub fn read_table(path: &Path) -> Result<Table, DataFormatError> {
    let mut workbook: Xlsx<_> =
        open_workbook(path).map_err(|e: XlsxError| DataFormatError::Workbook(e.to_string()))?;

    let sheet_name = workbook
        .sheet_names()
        .first()
        .cloned()
        .ok_or(DataFormatError::NoWorksheet)?;
    let range = workbook
        .worksheet_range(&sheet_name)
        .map_err(|e| DataFormatError::Workbook(e.to_string()))?;

    let (first_row, first_col) = range
        .start()
        .map_or((0, 0), |(r, c)| (r as usize, c as usize));

    let mut rows = Vec::with_capacity(range.height());
    for (r, row) in range.rows().enumerate() {
        let mut cells = Vec::with_capacity(row.len());
        for (c, data) in row.iter().enumerate() {
            let text = cell_text(data).ok_or(DataFormatError::CellError {
                row: first_row + r + 1,
                column: first_col + c + 1,
            })?;
            cells.push(text);
        }
        rows.push(cells);
    }

    Ok(Table {
        first_row: first_row + 1,
        rows,
    })
}

/// Load questions from a spreadsheet, in file order.
///
/// A missing file is an empty question set, not an error.
///
/// # Errors
///
/// Returns `DataFormatError` if the file exists but cannot be parsed into questions.
pub fn load_questions(path: &Path) -> Result<Vec<Question>, DataFormatError> {
    if !path.exists() {
        tracing::debug!(path = %path.display(), "question file missing, using empty set");
        return Ok(Vec::new());
    }
    let questions = read_table(path)?.questions()?;
    tracing::debug!(path = %path.display(), count = questions.len(), "loaded questions");
    Ok(questions)
}

//
// ─── CANONICAL SOURCE ──────────────────────────────────────────────────────────
//

/// The single question file shared by all new quiz sessions.
#[derive(Debug, Clone)]
pub struct QuestionSource {
    dir: PathBuf,
}

impl QuestionSource {
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Create the upload directory if needed.
    ///
    /// # Errors
    ///
    /// Returns the underlying I/O error.
    pub fn ensure_dir(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(&self.dir)
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the canonical question file.
    #[must_use]
    pub fn path(&self) -> PathBuf {
        self.dir.join(QUESTIONS_FILE_NAME)
    }

    /// Load the current question set.
    ///
    /// # Errors
    ///
    /// See [`load_questions`].
    pub fn load(&self) -> Result<Vec<Question>, DataFormatError> {
        load_questions(&self.path())
    }

    /// Replace the canonical file with an uploaded workbook.
    ///
    /// The upload is written to a temporary file next to the canonical one,
    /// parsed, and only then renamed into place, so readers never see a
    /// partial file and a bad upload leaves the previous set in effect.
    /// Returns the number of questions in the new set.
    ///
    /// # Errors
    ///
    /// Returns `UploadError` if the name is empty or has the wrong extension,
    /// if the contents do not parse, or on I/O failure.
    pub fn replace(&self, filename: &str, bytes: &[u8]) -> Result<usize, UploadError> {
        if filename.trim().is_empty() {
            return Err(UploadError::NoFileSelected);
        }
        if !allowed_file(filename) {
            return Err(UploadError::InvalidFileType {
                filename: filename.to_owned(),
            });
        }

        self.ensure_dir()?;
        let mut staged = tempfile::Builder::new()
            .prefix(".upload-")
            .suffix(".xlsx")
            .tempfile_in(&self.dir)?;
        staged.write_all(bytes)?;
        staged.as_file().sync_all()?;

        let count = read_table(staged.path())?.questions()?.len();

        staged.persist(self.path()).map_err(|e| e.error)?;
        tracing::info!(filename, count, "question file replaced");
        Ok(count)
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;

    fn row(cells: &[&str]) -> Vec<String> {
        cells.iter().map(|c| (*c).to_owned()).collect()
    }

    fn header() -> Vec<String> {
        row(&[
            "type", "question", "option1", "option2", "option3", "option4", "answer", "image_url",
        ])
    }

    #[test]
    fn allowed_file_checks_extension() {
        assert!(allowed_file("questions.xlsx"));
        assert!(allowed_file("Q.XLSX"));
        assert!(!allowed_file("questions.csv"));
        assert!(!allowed_file("xlsx"));
        assert!(!allowed_file("archive.xlsx.zip"));
    }

    #[test]
    fn table_rows_become_questions_in_order() {
        let table = Table {
            first_row: 1,
            rows: vec![
                header(),
                row(&["text", "2+2?", "3", "4", "5", "6", "4", ""]),
                row(&["image", "Which flag?", "FR", "DE", "IT", "ES", "FR", "flags/fr.png"]),
                row(&["text", "Sky colour?", "red", "blue", "green", "pink", "blue", "ignored.png"]),
            ],
        };

        let questions = table.questions().unwrap();

        assert_eq!(questions.len(), 3);
        assert_eq!(questions[0].prompt(), "2+2?");
        assert_eq!(questions[1].image_ref(), Some("flags/fr.png"));
        assert_eq!(questions[2].image_ref(), None);
        assert_eq!(questions[2].option(1), Some("blue"));
    }

    #[test]
    fn header_order_does_not_matter() {
        let table = Table {
            first_row: 1,
            rows: vec![
                row(&["Answer", "option4", "option3", "option2", "option1", "Question", "TYPE"]),
                row(&["b", "d", "c", "b", "a", "Pick b", "text"]),
            ],
        };

        let questions = table.questions().unwrap();

        assert_eq!(questions[0].options()[0], "a");
        assert_eq!(questions[0].correct_answer(), "b");
    }

    #[test]
    fn missing_column_fails_the_load() {
        let table = Table {
            first_row: 1,
            rows: vec![row(&["type", "question", "option1", "option2", "option3", "answer"])],
        };
        let err = table.questions().unwrap_err();
        assert!(matches!(
            err,
            DataFormatError::MissingColumn { column: "option4" }
        ));
    }

    #[test]
    fn image_row_without_url_reports_row_number() {
        let table = Table {
            first_row: 1,
            rows: vec![
                header(),
                row(&["text", "ok", "a", "b", "c", "d", "a", ""]),
                row(&["text_image", "Whose face?", "a", "b", "c", "d", "a", ""]),
            ],
        };
        let err = table.questions().unwrap_err();
        assert!(matches!(
            err,
            DataFormatError::InvalidRow {
                row: 3,
                source: QuestionError::MissingImage { .. }
            }
        ));
    }

    #[test]
    fn image_row_without_url_column_fails() {
        let table = Table {
            first_row: 1,
            rows: vec![
                row(&["type", "question", "option1", "option2", "option3", "option4", "answer"]),
                row(&["image", "Which flag?", "a", "b", "c", "d", "a"]),
            ],
        };
        assert!(matches!(
            table.questions().unwrap_err(),
            DataFormatError::InvalidRow { row: 2, .. }
        ));
    }

    #[test]
    fn blank_type_is_a_missing_value() {
        let table = Table {
            first_row: 1,
            rows: vec![header(), row(&["  ", "Q", "a", "b", "c", "d", "a", ""])],
        };
        assert!(matches!(
            table.questions().unwrap_err(),
            DataFormatError::MissingValue {
                row: 2,
                column: "type"
            }
        ));
    }

    #[test]
    fn blank_rows_are_skipped_and_short_rows_fail() {
        let table = Table {
            first_row: 1,
            rows: vec![
                header(),
                row(&["", "", "", "", "", "", "", ""]),
                row(&["text", "Q", "a", "b"]),
            ],
        };
        assert!(matches!(
            table.questions().unwrap_err(),
            DataFormatError::InvalidRow {
                row: 3,
                source: QuestionError::EmptyOption { position: 3 }
            }
        ));
    }

    #[test]
    fn empty_table_is_empty_set() {
        assert!(Table::default().questions().unwrap().is_empty());
    }

    #[test]
    fn whole_floats_render_as_integers() {
        assert_eq!(format_float(4.0), "4");
        assert_eq!(format_float(-12.0), "-12");
        assert_eq!(format_float(2.5), "2.5");
        assert_eq!(cell_text(&Data::Float(3.0)).as_deref(), Some("3"));
        assert_eq!(cell_text(&Data::Empty).as_deref(), Some(""));
    }

    #[test]
    fn missing_file_is_empty_set() {
        let dir = tempfile::tempdir().unwrap();
        let questions = load_questions(&dir.path().join("nope.xlsx")).unwrap();
        assert!(questions.is_empty());
    }

    #[test]
    fn replace_rejects_bad_names_without_touching_dir() {
        let dir = tempfile::tempdir().unwrap();
        let source = QuestionSource::new(dir.path().join("uploads"));

        assert!(matches!(
            source.replace("", b"data"),
            Err(UploadError::NoFileSelected)
        ));
        assert!(matches!(
            source.replace("questions.csv", b"data"),
            Err(UploadError::InvalidFileType { .. })
        ));
        assert!(!source.dir().exists());
    }

    #[test]
    fn replace_rejects_garbage_and_keeps_no_file() {
        let dir = tempfile::tempdir().unwrap();
        let source = QuestionSource::new(dir.path());

        let err = source.replace("questions.xlsx", b"not a zip").unwrap_err();

        assert!(matches!(
            err,
            UploadError::DataFormat(DataFormatError::Workbook(_))
        ));
        assert!(!source.path().exists());
        let leftovers: Vec<_> = std::fs::read_dir(dir.path()).unwrap().collect();
        assert!(leftovers.is_empty());
    }
}
