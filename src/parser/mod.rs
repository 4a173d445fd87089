//! Parsing for the C-family sources under repair.
//!
//! Exactly two grammars are in play, so the parser keeps one long-lived
//! tree-sitter instance per grammar behind a mutex rather than a
//! per-language cache. Tree handles are scoped resources: extraction copies
//! out whatever it needs and drops the [`ParsedFile`].

use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use tree_sitter::{Node, Parser as TsParser, Tree};

use crate::core::{Error, Language, Result, SourceFile};

/// Shared parser pool, one slot per grammar.
pub struct Parser {
    c: Mutex<TsParser>,
    cpp: Mutex<TsParser>,
}

impl Default for Parser {
    fn default() -> Self {
        Self::new()
    }
}

impl Parser {
    pub fn new() -> Self {
        Self {
            c: Mutex::new(grammar_parser(&tree_sitter_c::LANGUAGE.into())),
            cpp: Mutex::new(grammar_parser(&tree_sitter_cpp::LANGUAGE.into())),
        }
    }

    /// Read, language-detect, and parse a file in one step.
    pub fn parse_file(&self, path: impl AsRef<Path>) -> Result<ParsedFile> {
        let file = SourceFile::load(path)?;
        self.parse(&file.content, file.language, &file.path)
    }

    /// Parse content under an explicit grammar.
    pub fn parse(&self, content: &[u8], language: Language, path: &Path) -> Result<ParsedFile> {
        let slot = match language {
            Language::C => &self.c,
            Language::Cpp => &self.cpp,
        };
        let tree = slot
            .lock()
            .parse(content, None)
            .ok_or_else(|| Error::Parse {
                path: path.to_path_buf(),
                message: "tree-sitter produced no tree".to_string(),
            })?;

        Ok(ParsedFile {
            tree,
            source: content.to_vec(),
            path: path.to_path_buf(),
        })
    }
}

/// Build a parser wired to one bundled grammar.
fn grammar_parser(language: &tree_sitter::Language) -> TsParser {
    let mut parser = TsParser::new();
    parser
        .set_language(language)
        .expect("bundled grammar matches the linked tree-sitter ABI");
    parser
}

/// A parsed file: the tree together with the bytes it was built from.
#[derive(Debug)]
pub struct ParsedFile {
    tree: Tree,
    source: Vec<u8>,
    path: PathBuf,
}

impl ParsedFile {
    /// Root of the syntax tree.
    pub fn root(&self) -> Node<'_> {
        self.tree.root_node()
    }

    /// The bytes the tree was parsed from.
    pub fn source(&self) -> &[u8] {
        &self.source
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Source text covered by a node; empty on invalid UTF-8.
    pub fn text_of(&self, node: &Node<'_>) -> &str {
        node.utf8_text(&self.source).unwrap_or("")
    }
}
