//! Offline page bundle: one JSON object per line, optionally bzip2-compressed.
//!
//! ```text
//! {"kind":"article","title":"Rīga","talk":"{{CEE Spring 2025|...}}","content":"...","size":5120,"pageid":42,"wikidata_id":"Q1773"}
//! {"kind":"structure","title":"Wikimedia CEE Spring 2025/Structure/Latvia","content":"...","redirect":false}
//! ```

use bzip2::read::BzDecoder;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use crate::article::{ArticleRecord, PageInfo};
use crate::error::{Error, Result};
use crate::suggested::StructurePage;

const READ_BUFFER: usize = 256 * 1024;

/// Contest article with its talk page and API metadata.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArticlePage {
    pub title: String,
    /// Talk page markup, empty when the talk page is missing
    #[serde(default)]
    pub talk: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub size: u64,
    #[serde(default)]
    pub pageid: u64,
    #[serde(default)]
    pub wikidata_id: Option<String>,
}

impl ArticlePage {
    pub fn info(&self) -> PageInfo {
        PageInfo {
            size: self.size,
            page_id: self.pageid,
            wikidata_id: self.wikidata_id.clone(),
        }
    }
}

/// Meta-Wiki structure page listing suggested articles.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructureRecord {
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub redirect: bool,
}

impl StructureRecord {
    pub fn page(&self) -> StructurePage {
        StructurePage {
            title: self.title.clone(),
            redirect: self.redirect,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BundleRecord {
    Article(ArticlePage),
    Structure(StructureRecord),
}

/// All records of a bundle, split by kind, each in file order.
#[derive(Debug, Default)]
pub struct Bundle {
    pub articles: Vec<ArticlePage>,
    pub structures: Vec<StructureRecord>,
}

/// Open a bundle file, decompressing `.bz2` transparently.
pub fn open_input(path: &Path) -> Result<Box<dyn BufRead>> {
    let file = File::open(path)?;
    let reader: Box<dyn BufRead> = if path.to_string_lossy().ends_with(".bz2") {
        Box::new(BufReader::with_capacity(READ_BUFFER, BzDecoder::new(file)))
    } else {
        Box::new(BufReader::with_capacity(READ_BUFFER, file))
    };
    Ok(reader)
}

/// Parse JSON lines. Blank lines are skipped; a malformed line aborts with
/// its 1-based line number.
pub fn read_bundle<R: BufRead>(reader: R) -> Result<Bundle> {
    let mut bundle = Bundle::default();

    for (i, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let record: BundleRecord = serde_json::from_str(&line)
            .map_err(|source| Error::Json { line: i + 1, source })?;
        match record {
            BundleRecord::Article(page) => bundle.articles.push(page),
            BundleRecord::Structure(page) => bundle.structures.push(page),
        }
    }

    tracing::debug!(
        articles = bundle.articles.len(),
        structures = bundle.structures.len(),
        "bundle loaded"
    );
    Ok(bundle)
}

pub fn load_bundle(path: &Path) -> Result<Bundle> {
    read_bundle(open_input(path)?)
}

/// Dump merged article records, one JSON object per line.
pub fn write_jsonl<W: Write>(records: &[ArticleRecord], writer: W) -> Result<()> {
    let mut writer = BufWriter::new(writer);
    for record in records {
        serde_json::to_writer(&mut writer, record).map_err(std::io::Error::from)?;
        writer.write_all(b"\n")?;
    }
    writer.flush()?;
    Ok(())
}
