//! Full-text index over the latest record of every package family.
//!
//! The index lives entirely in RAM and is rebuilt from scratch on every
//! catalog reload, in lockstep with the listing it describes. Documents are
//! keyed by package name, which is the only stored field.
//!
//! Queries narrow as they grow: every word must match. A word matches a
//! package whose release version it equals, or whose name, tags or
//! description contain a term starting with it (after stemming).

use crate::error::{ErrorKind, Result};
use exn::ResultExt;
use std::sync::Arc;
use tantivy::collector::TopDocs;
use tantivy::query::{BooleanQuery, BoostQuery, Occur, Query, RegexQuery, TermQuery};
use tantivy::schema::{Field, IndexRecordOption, STORED, STRING, Schema, TextFieldIndexing, TextOptions, Value};
use tantivy::tokenizer::TokenStream;
use tantivy::{Index, IndexReader, IndexWriter, ReloadPolicy, TantivyDocument, Term};
use tracing::instrument;
use uniview_feed::models::PackageRecord;

/// Tag matches weigh ten times as much as any other field.
const TAGS_BOOST: f32 = 10.0;
/// Smallest writer arena tantivy accepts for a single indexing thread.
const WRITER_MEMORY: usize = 15_000_000;

#[derive(Debug, Clone, Copy)]
struct Fields {
    name: Field,
    tags: Field,
    description: Field,
    release_version: Field,
    reference: Field,
}
impl Fields {
    fn schema() -> (Schema, Self) {
        let text = TextOptions::default().set_indexing_options(
            TextFieldIndexing::default()
                .set_tokenizer("en_stem")
                .set_index_option(IndexRecordOption::WithFreqsAndPositions),
        );
        let mut builder = Schema::builder();
        let fields = Self {
            name: builder.add_text_field("name", text.clone()),
            tags: builder.add_text_field("tags", text.clone()),
            description: builder.add_text_field("description", text),
            release_version: builder.add_text_field("release_version", STRING),
            reference: builder.add_text_field("ref", STRING | STORED),
        };
        (builder.build(), fields)
    }

    fn weighted_text(&self) -> [(Field, f32); 3] {
        [(self.name, 1.0), (self.tags, TAGS_BOOST), (self.description, 1.0)]
    }
}

/// Searchable snapshot of package families.
#[derive(Clone)]
pub struct SearchIndex {
    index: Index,
    reader: IndexReader,
    fields: Fields,
    documents: usize,
}
impl SearchIndex {
    /// Index one document per record.
    #[instrument(skip_all, fields(documents = records.len()))]
    pub fn build(records: &[Arc<PackageRecord>]) -> Result<Self> {
        let (schema, fields) = Fields::schema();
        let index = Index::create_in_ram(schema);
        let mut writer: IndexWriter = index.writer_with_num_threads(1, WRITER_MEMORY).or_raise(|| ErrorKind::SearchIndex)?;
        for record in records {
            let mut document = TantivyDocument::default();
            document.add_text(fields.name, &record.name);
            for tag in &record.tags {
                document.add_text(fields.tags, tag);
            }
            document.add_text(fields.description, &record.description);
            document.add_text(fields.release_version, record.release_version);
            document.add_text(fields.reference, &record.name);
            writer.add_document(document).or_raise(|| ErrorKind::SearchIndex)?;
        }
        writer.commit().or_raise(|| ErrorKind::SearchIndex)?;
        let reader: IndexReader = index
            .reader_builder()
            .reload_policy(ReloadPolicy::Manual)
            .try_into()
            .or_raise(|| ErrorKind::SearchIndex)?;
        Ok(Self {
            index,
            reader,
            fields,
            documents: records.len(),
        })
    }

    /// Names of matching packages, most relevant first.
    ///
    /// Queries without any searchable word match nothing; a search never
    /// fails from the caller's point of view.
    pub fn search(&self, query: &str) -> Vec<String> {
        if self.documents == 0 {
            return Vec::new();
        }
        let query = match self.query(query) {
            Ok(Some(query)) => query,
            Ok(None) => return Vec::new(),
            Err(err) => {
                tracing::debug!(query, error = ?err, "Unusable search query");
                return Vec::new();
            },
        };
        let searcher = self.reader.searcher();
        let hits = match searcher.search(&query, &TopDocs::with_limit(self.documents)) {
            Ok(hits) => hits,
            Err(err) => {
                tracing::warn!(error = %err, "Search failed");
                return Vec::new();
            },
        };
        hits.into_iter()
            .filter_map(|(_score, address)| {
                let document: TantivyDocument = searcher.doc(address).ok()?;
                document.get_first(self.fields.reference).and_then(|value| value.as_str()).map(str::to_string)
            })
            .collect()
    }

    fn query(&self, text: &str) -> Result<Option<BooleanQuery>> {
        let mut analyzer = self.index.tokenizer_for_field(self.fields.name).or_raise(|| ErrorKind::SearchIndex)?;
        let mut words: Vec<(Occur, Box<dyn Query>)> = Vec::new();
        for word in text.split_whitespace() {
            let mut stems = Vec::new();
            let mut stream = analyzer.token_stream(word);
            while stream.advance() {
                stems.push(stream.token().text.clone());
            }
            if stems.is_empty() {
                continue;
            }
            let mut prefixes: Vec<(Occur, Box<dyn Query>)> = Vec::with_capacity(stems.len());
            for stem in &stems {
                prefixes.push((Occur::Must, Box::new(self.prefix_query(stem)?) as Box<dyn Query>));
            }
            let release = TermQuery::new(Term::from_field_text(self.fields.release_version, word), IndexRecordOption::Basic);
            words.push((
                Occur::Must,
                Box::new(BooleanQuery::new(vec![
                    (Occur::Should, Box::new(release) as Box<dyn Query>),
                    (Occur::Should, Box::new(BooleanQuery::new(prefixes))),
                ])) as Box<dyn Query>,
            ));
        }
        Ok((!words.is_empty()).then(|| BooleanQuery::new(words)))
    }

    /// Any text field holding `stem` itself or a term starting with it. Exact
    /// hits score by relevance on top of the flat prefix score.
    fn prefix_query(&self, stem: &str) -> Result<BooleanQuery> {
        let mut clauses: Vec<(Occur, Box<dyn Query>)> = Vec::new();
        for (field, boost) in self.fields.weighted_text() {
            // Stems are alphanumeric, so they are safe to use as a pattern.
            let prefix = RegexQuery::from_pattern(&format!("{stem}.*"), field).or_raise(|| ErrorKind::SearchIndex)?;
            let exact = TermQuery::new(Term::from_field_text(field, stem), IndexRecordOption::WithFreqs);
            clauses.push((Occur::Should, Box::new(BoostQuery::new(Box::new(prefix), boost)) as Box<dyn Query>));
            clauses.push((Occur::Should, Box::new(BoostQuery::new(Box::new(exact), boost)) as Box<dyn Query>));
        }
        Ok(BooleanQuery::new(clauses))
    }

    pub fn len(&self) -> usize {
        self.documents
    }

    pub fn is_empty(&self) -> bool {
        self.documents == 0
    }
}
impl std::fmt::Debug for SearchIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SearchIndex").field("documents", &self.documents).finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use uniview_feed::Normalizer;
    use uniview_feed::models::RawPackage;

    fn record(name: &str, tags: &[&str], description: &str, release_version: u64) -> Arc<PackageRecord> {
        let raw: RawPackage = serde_json::from_value(serde_json::json!({
            "name": name,
            "version": "1.0",
            "releaseVersion": release_version,
            "tags": tags,
            "description": description,
        }))
        .unwrap();
        Arc::new(Normalizer::default().normalize(raw, false))
    }

    fn index() -> SearchIndex {
        SearchIndex::build(&[
            record("cassandra", &["database", "nosql"], "Apache Cassandra running on DC/OS", 5),
            record("kafka", &["message", "broker"], "Apache Kafka stores messages in a database-like log", 12),
            record("jenkins", &["ci", "automation"], "Jenkins continuous integration server", 7),
        ])
        .unwrap()
    }

    #[test]
    fn test_search_by_name() {
        assert_eq!(index().search("jenkins"), vec!["jenkins"]);
    }

    #[test]
    fn test_tags_outrank_description() {
        // "database" is a tag of cassandra but only description text for kafka.
        assert_eq!(index().search("database"), vec!["cassandra", "kafka"]);
    }

    #[test]
    fn test_stemming_and_case() {
        assert_eq!(index().search("Messages"), vec!["kafka"]);
    }

    #[test]
    fn test_search_release_version() {
        assert_eq!(index().search("12"), vec!["kafka"]);
    }

    #[rstest]
    #[case::name("cass", vec!["cassandra"])]
    #[case::description("integ", vec!["jenkins"])]
    #[case::mixed_case("JENK", vec!["jenkins"])]
    fn test_prefix_match(#[case] query: &str, #[case] expected: Vec<&str>) {
        assert_eq!(index().search(query), expected);
    }

    #[test]
    fn test_every_word_must_match() {
        assert_eq!(index().search("kafka data"), vec!["kafka"]);
        assert_eq!(index().search("apache cassandra"), vec!["cassandra"]);
        assert_eq!(index().search("12 broker"), vec!["kafka"]);
    }

    #[rstest]
    #[case("")]
    #[case("   ")]
    #[case("zookeeper")]
    #[case("jenkins database")]
    #[case("jenkins cassandra")]
    #[case("?!")]
    fn test_search_nothing(#[case] query: &str) {
        assert!(index().search(query).is_empty());
    }

    #[test]
    fn test_empty_index() {
        let index = SearchIndex::build(&[]).unwrap();
        assert!(index.is_empty());
        assert!(index.search("cassandra").is_empty());
    }
}
