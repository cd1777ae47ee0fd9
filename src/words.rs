use std::cell::RefCell;
use std::fs;
use std::path::{Path, PathBuf};

use include_dir::{include_dir, Dir};
use rand::seq::SliceRandom;
use rusqlite::{params, Connection, OptionalExtension};
use tracing::{debug, info, warn};

use crate::error::StoreError;

static WORDS_DIR: Dir = include_dir!("$CARGO_MANIFEST_DIR/assets/words");

/// Served when the dictionary has nothing to offer.
pub const FALLBACK_WORD: &str = "juanpablo";
pub const FALLBACK_CATEGORY: &str = "Unknown";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Word {
    pub text: String,
    pub category: String,
}

impl Word {
    pub fn new(text: impl Into<String>, category: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            category: category.into(),
        }
    }

    pub fn fallback() -> Self {
        Self::new(FALLBACK_WORD, FALLBACK_CATEGORY)
    }
}

/// Dictionary the game draws its words from
pub trait WordSource {
    /// Never fails: implementations answer [`Word::fallback`] when empty.
    fn draw_random_word(&self) -> Word;
    /// Returns true only if the word was newly added.
    fn bulk_insert(&self, word: &str, category: &str) -> bool;
}

impl<W: WordSource + ?Sized> WordSource for Box<W> {
    fn draw_random_word(&self) -> Word {
        (**self).draw_random_word()
    }

    fn bulk_insert(&self, word: &str, category: &str) -> bool {
        (**self).bulk_insert(word, category)
    }
}

/// Parses one `word;category` import line. The word is lowercased and must be
/// alphabetic, the category is capitalized.
pub fn parse_word_line(line: &str) -> Option<Word> {
    let parts: Vec<&str> = line.trim().split(';').collect();
    let [word, category] = parts.as_slice() else {
        return None;
    };

    let word = word.trim().to_lowercase();
    if word.is_empty() || !word.chars().all(char::is_alphabetic) {
        return None;
    }

    Some(Word::new(word, capitalize(category.trim())))
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
        None => String::new(),
    }
}

/// SQLite-backed dictionary
#[derive(Debug)]
pub struct WordDb {
    conn: Connection,
}

impl WordDb {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        Self::init(Connection::open(path)?)
    }

    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self, StoreError> {
        conn.execute(
            r#"
            CREATE TABLE IF NOT EXISTS words (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                text TEXT UNIQUE NOT NULL,
                category TEXT NOT NULL
            )
            "#,
            [],
        )?;
        Ok(WordDb { conn })
    }

    pub fn count(&self) -> Result<usize, StoreError> {
        let n: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM words", [], |row| row.get(0))?;
        Ok(usize::try_from(n).unwrap_or(0))
    }

    /// Inserts parsed `word;category` lines in one transaction. Returns how
    /// many words were added.
    pub fn import_lines<'a, I>(&mut self, lines: I) -> Result<usize, StoreError>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let tx = self.conn.transaction()?;
        let mut added = 0;
        for word in lines.into_iter().filter_map(parse_word_line) {
            added += tx.execute(
                "INSERT OR IGNORE INTO words (text, category) VALUES (?1, ?2)",
                params![word.text, word.category],
            )?;
        }
        tx.commit()?;
        Ok(added)
    }

    /// Loads the bundled word lists, but only into an empty dictionary.
    pub fn seed_defaults(&mut self) -> Result<usize, StoreError> {
        if self.count()? > 0 {
            return Ok(0);
        }
        self.import_bundled()
    }

    /// Merges the bundled word lists into the dictionary.
    pub fn import_bundled(&mut self) -> Result<usize, StoreError> {
        let mut added = 0;
        for file in WORDS_DIR.files() {
            if let Some(contents) = file.contents_utf8() {
                added += self.import_lines(contents.lines())?;
            }
        }
        info!(added, "imported bundled words");
        Ok(added)
    }

    fn try_draw(&self) -> rusqlite::Result<Option<Word>> {
        self.conn
            .query_row(
                "SELECT text, category FROM words ORDER BY RANDOM() LIMIT 1",
                [],
                |row| Ok(Word::new(row.get::<_, String>(0)?, row.get::<_, String>(1)?)),
            )
            .optional()
    }
}

impl WordSource for WordDb {
    fn draw_random_word(&self) -> Word {
        match self.try_draw() {
            Ok(Some(word)) => word,
            Ok(None) => {
                debug!("dictionary empty, using fallback word");
                Word::fallback()
            }
            Err(e) => {
                warn!(error = %e, "failed to draw word, using fallback");
                Word::fallback()
            }
        }
    }

    fn bulk_insert(&self, word: &str, category: &str) -> bool {
        match self.conn.execute(
            "INSERT OR IGNORE INTO words (text, category) VALUES (?1, ?2)",
            params![word, category],
        ) {
            Ok(changed) => changed > 0,
            Err(e) => {
                warn!(error = %e, word, "failed to insert word");
                false
            }
        }
    }
}

/// In-memory dictionary, used when no database is available
#[derive(Debug, Default)]
pub struct WordList {
    words: RefCell<Vec<Word>>,
}

impl WordList {
    pub fn new(words: Vec<Word>) -> Self {
        Self {
            words: RefCell::new(words),
        }
    }

    /// The bundled word lists, without touching any database.
    pub fn bundled() -> Self {
        let words = WORDS_DIR
            .files()
            .filter_map(|f| f.contents_utf8())
            .flat_map(str::lines)
            .filter_map(parse_word_line)
            .collect();
        Self::new(words)
    }

    pub fn len(&self) -> usize {
        self.words.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.borrow().is_empty()
    }
}

impl WordSource for WordList {
    fn draw_random_word(&self) -> Word {
        self.words
            .borrow()
            .choose(&mut rand::thread_rng())
            .cloned()
            .unwrap_or_else(Word::fallback)
    }

    fn bulk_insert(&self, word: &str, category: &str) -> bool {
        let mut words = self.words.borrow_mut();
        if words.iter().any(|w| w.text == word) {
            return false;
        }
        words.push(Word::new(word, category));
        true
    }
}

/// Imports a `word;category` text file through [`WordSource::bulk_insert`].
/// Malformed lines and duplicates are skipped. Returns how many words were
/// added.
pub fn import_file<W, P>(words: &W, path: P) -> Result<usize, StoreError>
where
    W: WordSource + ?Sized,
    P: AsRef<Path>,
{
    let path = path.as_ref();
    let contents = fs::read_to_string(path)?;
    let added = contents
        .lines()
        .filter_map(parse_word_line)
        .filter(|word| words.bulk_insert(&word.text, &word.category))
        .count();
    info!(added, path = %path.display(), "imported words");
    Ok(added)
}

/// Default on-disk location of the dictionary inside `data_dir`.
pub fn db_path(data_dir: &Path) -> PathBuf {
    data_dir.join("words.db")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_parse_word_line() {
        assert_eq!(
            parse_word_line("  Giraffe ; aNIMALS "),
            Some(Word::new("giraffe", "Animals"))
        );
        assert_eq!(parse_word_line("giraffe"), None);
        assert_eq!(parse_word_line("a;b;c"), None);
        assert_eq!(parse_word_line("ice cream;food"), None);
        assert_eq!(parse_word_line("r2d2;robots"), None);
        assert_eq!(parse_word_line(";food"), None);
        assert_eq!(parse_word_line("kiwi;"), Some(Word::new("kiwi", "")));
    }

    #[test]
    fn test_empty_db_draws_fallback() {
        let db = WordDb::open_in_memory().unwrap();
        assert_eq!(db.draw_random_word(), Word::fallback());
    }

    #[test]
    fn test_bulk_insert_rejects_duplicates() {
        let db = WordDb::open_in_memory().unwrap();

        assert!(db.bulk_insert("otter", "Animals"));
        assert!(!db.bulk_insert("otter", "Animals"));
        assert_eq!(db.count().unwrap(), 1);
        assert_eq!(db.draw_random_word(), Word::new("otter", "Animals"));
    }

    #[test]
    fn test_import_file_counts_new_words() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("words.txt");
        fs::write(
            &path,
            "Cat;animals\nnot a line\ndog;Animals\ncat;animals\nb4d;x\n\napple;FOOD\n",
        )
        .unwrap();

        let db = WordDb::open(dir.path().join("db").join("words.db")).unwrap();
        assert_eq!(import_file(&db, &path).unwrap(), 3);
        assert_eq!(import_file(&db, &path).unwrap(), 0);
        assert_eq!(db.count().unwrap(), 3);
    }

    #[test]
    fn test_import_missing_file_is_io_error() {
        let db = WordDb::open_in_memory().unwrap();
        let err = import_file(&db, "/definitely/not/here.txt").unwrap_err();
        assert!(matches!(err, StoreError::Io(_)));
    }

    #[test]
    fn test_seed_defaults_only_when_empty() {
        let mut db = WordDb::open_in_memory().unwrap();
        let added = db.seed_defaults().unwrap();

        assert!(added > 0);
        assert_eq!(db.count().unwrap(), added);
        assert_eq!(db.seed_defaults().unwrap(), 0);

        let word = db.draw_random_word();
        assert!(word.text.chars().all(char::is_alphabetic));
        assert_ne!(word.category, FALLBACK_CATEGORY);
    }

    #[test]
    fn test_import_bundled_merges() {
        let mut db = WordDb::open_in_memory().unwrap();
        assert!(db.bulk_insert("zyzzyva", "Animals"));

        assert_eq!(db.seed_defaults().unwrap(), 0);
        let added = db.import_bundled().unwrap();
        assert_eq!(db.count().unwrap(), added + 1);
        assert_eq!(db.import_bundled().unwrap(), 0);
    }

    #[test]
    fn test_word_list() {
        let list = WordList::default();
        assert_eq!(list.draw_random_word(), Word::fallback());

        assert!(list.bulk_insert("moon", "Space"));
        assert!(!list.bulk_insert("moon", "Space"));
        assert_eq!(list.len(), 1);
        assert_eq!(list.draw_random_word(), Word::new("moon", "Space"));
        assert!(!WordList::bundled().is_empty());
    }
}
