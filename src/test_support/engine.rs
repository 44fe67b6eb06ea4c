//! In-memory [`NativeApi`] implementation.
//!
//! `MockEngine` imitates the observable behavior of the native engine
//! closely enough to exercise the wrapper contracts: binary data payloads,
//! unique-term upserts, write locks, read-only handles, pagination and the
//! native failure payload format. It also records every release so tests
//! can assert exactly-once disposal.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use crate::native::{
    DocId, HandleKind, MatchItem, NativeApi, NativeFailure, NativeResult, OpenMode, QueryOp,
    RawHandle, StemStrategy,
};

const KNOWN_LANGUAGES: &[&str] = &[
    "danish", "dutch", "english", "finnish", "french", "german", "italian", "norwegian",
    "portuguese", "russian", "spanish", "swedish",
];

#[derive(Debug, Clone, Default)]
struct MockDoc {
    data: Vec<u8>,
    terms: BTreeMap<String, (u32, Vec<u32>)>,
    values: BTreeMap<u32, Vec<u8>>,
}

impl MockDoc {
    fn add_term(&mut self, term: &str, wdf_inc: u32, pos: Option<u32>) {
        let entry = self.terms.entry(term.to_string()).or_default();
        entry.0 += wdf_inc;
        if let Some(pos) = pos {
            entry.1.push(pos);
        }
    }

    fn wdf(&self, term: &str) -> Option<u32> {
        self.terms.get(term).map(|(wdf, _)| *wdf)
    }
}

#[derive(Debug, Default)]
struct MockDb {
    docs: BTreeMap<DocId, MockDoc>,
    last_docid: DocId,
    locked: bool,
    commits: u32,
}

impl MockDb {
    fn find_by_term(&self, term: &str) -> Vec<DocId> {
        self.docs
            .iter()
            .filter(|(_, doc)| doc.terms.contains_key(term))
            .map(|(id, _)| *id)
            .collect()
    }

    fn termfreq(&self, term: &str) -> u32 {
        self.find_by_term(term).len() as u32
    }
}

#[derive(Debug, Clone)]
enum MockQuery {
    MatchNothing,
    Term { term: String, wqf: u32, pos: u32 },
    Combine { op: QueryOp, subqueries: Vec<MockQuery> },
    Value { op: QueryOp, slot: u32, lo: Vec<u8>, hi: Vec<u8> },
}

impl MockQuery {
    fn render(&self, out: &mut String) {
        match self {
            MockQuery::MatchNothing => {}
            MockQuery::Term { term, wqf, pos } => {
                out.push_str(term);
                if *wqf != 1 {
                    out.push_str(&format!("#{}", wqf));
                }
                if *pos != 0 {
                    out.push_str(&format!("@{}", pos));
                }
            }
            MockQuery::Combine { op, subqueries } => {
                out.push('(');
                for (i, sub) in subqueries.iter().enumerate() {
                    if i > 0 {
                        out.push_str(&format!(" {} ", op));
                    }
                    sub.render(out);
                }
                out.push(')');
            }
            MockQuery::Value { op, slot, lo, hi } => {
                out.push_str(&format!(
                    "{} {} {}",
                    op,
                    slot,
                    String::from_utf8_lossy(lo)
                ));
                if *op == QueryOp::ValueRange {
                    out.push_str(&format!(" {}", String::from_utf8_lossy(hi)));
                }
            }
        }
    }

    fn description(&self) -> String {
        let mut inner = String::new();
        self.render(&mut inner);
        format!("Query({})", inner)
    }

    /// Weight of `doc` under this query, or `None` if it does not match.
    fn weight(&self, doc: &MockDoc) -> Option<f64> {
        match self {
            MockQuery::MatchNothing => None,
            MockQuery::Term { term, wqf, .. } => {
                doc.wdf(term).map(|wdf| f64::from(wdf.max(1)) * f64::from((*wqf).max(1)))
            }
            MockQuery::Value { op, slot, lo, hi } => {
                let value = doc.values.get(slot)?;
                let hit = match op {
                    QueryOp::ValueGe => value.as_slice() >= lo.as_slice(),
                    QueryOp::ValueLe => value.as_slice() <= lo.as_slice(),
                    _ => value.as_slice() >= lo.as_slice() && value.as_slice() <= hi.as_slice(),
                };
                hit.then_some(0.0)
            }
            MockQuery::Combine { op, subqueries } => {
                let weights: Vec<Option<f64>> = subqueries.iter().map(|q| q.weight(doc)).collect();
                let first = weights.first().copied().flatten();
                match op {
                    QueryOp::And | QueryOp::Near | QueryOp::Phrase => {
                        if weights.iter().all(Option::is_some) {
                            Some(weights.iter().flatten().sum())
                        } else {
                            None
                        }
                    }
                    QueryOp::AndNot => {
                        let excluded = weights.iter().skip(1).any(Option::is_some);
                        if excluded {
                            None
                        } else {
                            first
                        }
                    }
                    QueryOp::AndMaybe => {
                        first.map(|w| w + weights.iter().skip(1).flatten().sum::<f64>())
                    }
                    QueryOp::Filter => {
                        if weights.iter().skip(1).all(Option::is_some) {
                            first
                        } else {
                            None
                        }
                    }
                    QueryOp::Xor => {
                        let hits: Vec<f64> = weights.iter().flatten().copied().collect();
                        (hits.len() % 2 == 1).then(|| hits.iter().sum())
                    }
                    QueryOp::Max => weights.iter().flatten().copied().reduce(f64::max),
                    _ => {
                        let hits: Vec<f64> = weights.iter().flatten().copied().collect();
                        (!hits.is_empty()).then(|| hits.iter().sum())
                    }
                }
            }
        }
    }
}

#[derive(Debug, Clone)]
struct MockParser {
    stemmer: Option<String>,
    strategy: StemStrategy,
    default_op: QueryOp,
    prefixes: HashMap<String, String>,
    boolean_prefixes: HashMap<String, String>,
}

impl Default for MockParser {
    fn default() -> Self {
        MockParser {
            stemmer: None,
            strategy: StemStrategy::Some,
            default_op: QueryOp::Or,
            prefixes: HashMap::new(),
            boolean_prefixes: HashMap::new(),
        }
    }
}

impl MockParser {
    fn parse(&self, text: &str) -> NativeResult<MockQuery> {
        let mut probabilistic = Vec::new();
        let mut filters = Vec::new();
        let mut pos = 0;

        for token in text.split_whitespace() {
            if matches!(token, "AND" | "OR" | "NOT") {
                continue;
            }
            if let Some((field, value)) = token.split_once(':') {
                if let Some(prefix) = self.boolean_prefixes.get(field) {
                    filters.push(MockQuery::Term {
                        term: format!("{}{}", prefix, value),
                        wqf: 1,
                        pos: 0,
                    });
                    continue;
                }
                if let Some(prefix) = self.prefixes.get(field) {
                    pos += 1;
                    probabilistic.push(self.word_query(prefix, value, pos));
                    continue;
                }
            }
            let word: String = token
                .chars()
                .filter(|c| c.is_alphanumeric())
                .collect::<String>()
                .to_lowercase();
            if word.is_empty() {
                continue;
            }
            pos += 1;
            probabilistic.push(self.word_query("", &word, pos));
        }

        if probabilistic.is_empty() && filters.is_empty() {
            return Ok(MockQuery::MatchNothing);
        }

        let mut query = combine(self.default_op, probabilistic);
        if !filters.is_empty() {
            let filter = combine(QueryOp::And, filters);
            query = match query {
                MockQuery::MatchNothing => filter,
                query => MockQuery::Combine {
                    op: QueryOp::Filter,
                    subqueries: vec![query, filter],
                },
            };
        }
        Ok(query)
    }

    fn word_query(&self, prefix: &str, word: &str, pos: u32) -> MockQuery {
        let word = word.to_lowercase();
        let term = match (&self.stemmer, self.strategy) {
            (Some(_), StemStrategy::Some) | (Some(_), StemStrategy::AllZ) => {
                format!("Z{}{}", prefix, stem_word(&word))
            }
            (Some(_), StemStrategy::All) => format!("{}{}", prefix, stem_word(&word)),
            _ => format!("{}{}", prefix, word),
        };
        MockQuery::Term { term, wqf: 1, pos }
    }
}

fn combine(op: QueryOp, mut subqueries: Vec<MockQuery>) -> MockQuery {
    match subqueries.len() {
        0 => MockQuery::MatchNothing,
        1 => subqueries.remove(0),
        _ => MockQuery::Combine { op, subqueries },
    }
}

/// A crude english-ish stemmer: lowercase and drop a plural `s`.
fn stem_word(word: &str) -> String {
    let lower = word.to_lowercase();
    match lower.strip_suffix('s') {
        Some(stem) if stem.len() > 2 && !stem.ends_with('s') => stem.to_string(),
        _ => lower,
    }
}

#[derive(Debug, Clone)]
struct MockMSet {
    items: Vec<(MatchItem, MockDoc)>,
    estimated: u32,
    db: Arc<Mutex<MockDb>>,
}

enum Object {
    Document(Arc<Mutex<MockDoc>>),
    Database {
        path: PathBuf,
        db: Arc<Mutex<MockDb>>,
        writable: bool,
        closed: bool,
    },
    Stem(Option<String>),
    TermGenerator {
        stemmer: Option<String>,
        doc: Option<Arc<Mutex<MockDoc>>>,
        termpos: u32,
    },
    QueryParser(MockParser),
    Query(MockQuery),
    Enquire {
        db: Arc<Mutex<MockDb>>,
        query: Option<MockQuery>,
    },
    MSet(MockMSet),
}

impl Object {
    fn kind(&self) -> HandleKind {
        match self {
            Object::Document(_) => HandleKind::Document,
            Object::Database { writable: true, .. } => HandleKind::WritableDatabase,
            Object::Database { .. } => HandleKind::Database,
            Object::Stem(_) => HandleKind::Stem,
            Object::TermGenerator { .. } => HandleKind::TermGenerator,
            Object::QueryParser(_) => HandleKind::QueryParser,
            Object::Query(_) => HandleKind::Query,
            Object::Enquire { .. } => HandleKind::Enquire,
            Object::MSet(_) => HandleKind::MSet,
        }
    }
}

#[derive(Default)]
struct State {
    next_id: usize,
    objects: HashMap<usize, Object>,
    databases: HashMap<PathBuf, Arc<Mutex<MockDb>>>,
    releases: HashMap<HandleKind, usize>,
    invalid_releases: usize,
    fail_next: Option<String>,
}

impl State {
    fn insert(&mut self, object: Object) -> RawHandle {
        self.next_id += 1;
        self.objects.insert(self.next_id, object);
        RawHandle::from_raw(self.next_id)
    }

    fn get(&self, handle: RawHandle) -> NativeResult<&Object> {
        self.objects
            .get(&handle.as_raw())
            .ok_or_else(|| invalid_handle(handle))
    }

    fn get_mut(&mut self, handle: RawHandle) -> NativeResult<&mut Object> {
        self.objects
            .get_mut(&handle.as_raw())
            .ok_or_else(|| invalid_handle(handle))
    }

    fn doc(&self, handle: RawHandle) -> NativeResult<Arc<Mutex<MockDoc>>> {
        match self.get(handle)? {
            Object::Document(doc) => Ok(doc.clone()),
            other => Err(wrong_kind(HandleKind::Document, other)),
        }
    }

    fn stem(&self, handle: RawHandle) -> NativeResult<Option<String>> {
        match self.get(handle)? {
            Object::Stem(language) => Ok(language.clone()),
            other => Err(wrong_kind(HandleKind::Stem, other)),
        }
    }

    fn query(&self, handle: RawHandle) -> NativeResult<MockQuery> {
        match self.get(handle)? {
            Object::Query(query) => Ok(query.clone()),
            other => Err(wrong_kind(HandleKind::Query, other)),
        }
    }

    fn parser(&mut self, handle: RawHandle) -> NativeResult<&mut MockParser> {
        match self.get_mut(handle)? {
            Object::QueryParser(parser) => Ok(parser),
            other => Err(wrong_kind(HandleKind::QueryParser, other)),
        }
    }

    fn mset(&self, handle: RawHandle) -> NativeResult<&MockMSet> {
        match self.get(handle)? {
            Object::MSet(mset) => Ok(mset),
            other => Err(wrong_kind(HandleKind::MSet, other)),
        }
    }

    /// Any open database handle, readable or writable.
    fn database(&self, handle: RawHandle) -> NativeResult<Arc<Mutex<MockDb>>> {
        match self.get(handle)? {
            Object::Database { closed: true, .. } => Err(NativeFailure::with_kind(
                "DatabaseClosedError",
                "Database has been closed",
            )),
            Object::Database { db, .. } => Ok(db.clone()),
            other => Err(wrong_kind(HandleKind::Database, other)),
        }
    }

    fn writable(&self, handle: RawHandle) -> NativeResult<Arc<Mutex<MockDb>>> {
        let db = self.database(handle)?;
        match self.get(handle)? {
            Object::Database { writable: true, .. } => Ok(db),
            _ => Err(NativeFailure::with_kind(
                "InvalidOperationError",
                "database handle is read-only",
            )),
        }
    }
}

fn invalid_handle(handle: RawHandle) -> NativeFailure {
    NativeFailure::with_kind(
        "InvalidArgumentError",
        format!("no live object for handle {}", handle.as_raw()),
    )
}

fn wrong_kind(expected: HandleKind, found: &Object) -> NativeFailure {
    NativeFailure::with_kind(
        "InvalidArgumentError",
        format!("expected a {} handle, got a {}", expected, found.kind()),
    )
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// An in-memory stand-in for the native engine.
#[derive(Default)]
pub struct MockEngine {
    state: Mutex<State>,
}

impl MockEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next fallible native call fail with `payload`.
    pub fn fail_next(&self, payload: impl Into<String>) {
        lock(&self.state).fail_next = Some(payload.into());
    }

    /// Create an empty database at `path`, as if built by another process.
    pub fn create_database(&self, path: impl AsRef<Path>) {
        lock(&self.state)
            .databases
            .entry(path.as_ref().to_path_buf())
            .or_default();
    }

    /// How many handles of `kind` have been released.
    pub fn release_count(&self, kind: HandleKind) -> usize {
        lock(&self.state).releases.get(&kind).copied().unwrap_or(0)
    }

    /// Releases of handles that were not live (double or foreign releases).
    pub fn invalid_releases(&self) -> usize {
        lock(&self.state).invalid_releases
    }

    /// Handles allocated and not yet released.
    pub fn live_handles(&self) -> usize {
        lock(&self.state).objects.len()
    }

    /// Number of commits applied to the database at `path`.
    pub fn commit_count(&self, path: impl AsRef<Path>) -> u32 {
        lock(&self.state)
            .databases
            .get(path.as_ref())
            .map(|db| lock(db).commits)
            .unwrap_or(0)
    }

    fn begin(&self) -> NativeResult<MutexGuard<'_, State>> {
        let mut state = lock(&self.state);
        if let Some(payload) = state.fail_next.take() {
            return Err(NativeFailure::new(payload));
        }
        Ok(state)
    }
}

impl NativeApi for MockEngine {
    fn version(&self) -> String {
        "mock-1.4.0".to_string()
    }

    fn release(&self, kind: HandleKind, handle: RawHandle) {
        let mut state = lock(&self.state);
        match state.objects.remove(&handle.as_raw()) {
            Some(object) if object.kind() == kind => {
                if let Object::Database {
                    db,
                    writable: true,
                    closed: false,
                    ..
                } = &object
                {
                    lock(db).locked = false;
                }
                *state.releases.entry(kind).or_default() += 1;
            }
            Some(object) => {
                // Released with the wrong type: keep it live and flag it.
                state.objects.insert(handle.as_raw(), object);
                state.invalid_releases += 1;
            }
            None => state.invalid_releases += 1,
        }
    }

    fn document_new(&self) -> NativeResult<RawHandle> {
        let mut state = self.begin()?;
        Ok(state.insert(Object::Document(Arc::default())))
    }

    fn document_set_data(&self, doc: RawHandle, data: &[u8]) -> NativeResult<()> {
        let state = self.begin()?;
        lock(&*(state.doc(doc)?)).data = data.to_vec();
        Ok(())
    }

    fn document_get_data(&self, doc: RawHandle) -> NativeResult<Vec<u8>> {
        let state = self.begin()?;
        let data = lock(&*(state.doc(doc)?)).data.clone();
        Ok(data)
    }

    fn document_add_term(&self, doc: RawHandle, term: &str, wdf_inc: u32) -> NativeResult<()> {
        let state = self.begin()?;
        lock(&*(state.doc(doc)?)).add_term(term, wdf_inc, None);
        Ok(())
    }

    fn document_add_posting(
        &self,
        doc: RawHandle,
        term: &str,
        pos: u32,
        wdf_inc: u32,
    ) -> NativeResult<()> {
        let state = self.begin()?;
        lock(&*(state.doc(doc)?)).add_term(term, wdf_inc, Some(pos));
        Ok(())
    }

    fn document_add_boolean_term(&self, doc: RawHandle, term: &str) -> NativeResult<()> {
        let state = self.begin()?;
        lock(&*(state.doc(doc)?)).add_term(term, 0, None);
        Ok(())
    }

    fn document_add_value(&self, doc: RawHandle, slot: u32, value: &[u8]) -> NativeResult<()> {
        let state = self.begin()?;
        lock(&*(state.doc(doc)?)).values.insert(slot, value.to_vec());
        Ok(())
    }

    fn document_terms(&self, doc: RawHandle) -> NativeResult<Vec<String>> {
        let state = self.begin()?;
        let terms = lock(&*(state.doc(doc)?)).terms.keys().cloned().collect();
        Ok(terms)
    }

    fn database_open(&self, path: &Path) -> NativeResult<RawHandle> {
        let mut state = self.begin()?;
        let db = state.databases.get(path).cloned().ok_or_else(|| {
            NativeFailure::with_kind(
                "DatabaseNotFoundError",
                format!("Couldn't stat '{}'", path.display()),
            )
        })?;
        Ok(state.insert(Object::Database {
            path: path.to_path_buf(),
            db,
            writable: false,
            closed: false,
        }))
    }

    fn writable_database_open(&self, path: &Path, mode: OpenMode) -> NativeResult<RawHandle> {
        let mut state = self.begin()?;
        let existing = state.databases.get(path).cloned();
        let db = match (mode, existing) {
            (OpenMode::Open, None) => {
                return Err(NativeFailure::with_kind(
                    "DatabaseNotFoundError",
                    format!("Couldn't stat '{}'", path.display()),
                ))
            }
            (OpenMode::Create, Some(_)) => {
                return Err(NativeFailure::with_kind(
                    "DatabaseCreateError",
                    format!("Can't create new database at '{}': a database already exists", path.display()),
                ))
            }
            (OpenMode::CreateOrOverwrite, Some(db)) => {
                let mut guard = lock(&db);
                if !guard.locked {
                    guard.docs.clear();
                    guard.last_docid = 0;
                }
                drop(guard);
                db
            }
            (_, Some(db)) => db,
            (_, None) => {
                let db = Arc::new(Mutex::new(MockDb::default()));
                state.databases.insert(path.to_path_buf(), db.clone());
                db
            }
        };

        {
            let mut guard = lock(&db);
            if guard.locked {
                return Err(NativeFailure::with_kind(
                    "DatabaseLockError",
                    format!("Unable to get write lock on {}: already locked", path.display()),
                ));
            }
            guard.locked = true;
        }

        Ok(state.insert(Object::Database {
            path: path.to_path_buf(),
            db,
            writable: true,
            closed: false,
        }))
    }

    fn database_doccount(&self, db: RawHandle) -> NativeResult<u32> {
        let state = self.begin()?;
        let count = lock(&*(state.database(db)?)).docs.len() as u32;
        Ok(count)
    }

    fn database_termfreq(&self, db: RawHandle, term: &str) -> NativeResult<u32> {
        let state = self.begin()?;
        let freq = lock(&*(state.database(db)?)).termfreq(term);
        Ok(freq)
    }

    fn database_get_document(&self, db: RawHandle, docid: DocId) -> NativeResult<RawHandle> {
        let mut state = self.begin()?;
        let doc = lock(&*(state.database(db)?))
            .docs
            .get(&docid)
            .cloned()
            .ok_or_else(|| {
                NativeFailure::with_kind("DocNotFoundError", format!("Document {} not found", docid))
            })?;
        Ok(state.insert(Object::Document(Arc::new(Mutex::new(doc)))))
    }

    fn database_close(&self, db: RawHandle) -> NativeResult<()> {
        let mut state = self.begin()?;
        match state.get_mut(db)? {
            Object::Database {
                db,
                writable,
                closed,
                ..
            } => {
                if *writable && !*closed {
                    let mut guard = lock(db);
                    guard.commits += 1;
                    guard.locked = false;
                }
                *closed = true;
                Ok(())
            }
            other => Err(wrong_kind(HandleKind::Database, other)),
        }
    }

    fn database_add_document(&self, db: RawHandle, doc: RawHandle) -> NativeResult<DocId> {
        let state = self.begin()?;
        let db = state.writable(db)?;
        let doc = lock(&*(state.doc(doc)?)).clone();
        let mut db = lock(&db);
        db.last_docid += 1;
        let docid = db.last_docid;
        db.docs.insert(docid, doc);
        Ok(docid)
    }

    fn database_replace_document(
        &self,
        db: RawHandle,
        unique_term: &str,
        doc: RawHandle,
    ) -> NativeResult<DocId> {
        let state = self.begin()?;
        let db = state.writable(db)?;
        let doc = lock(&*(state.doc(doc)?)).clone();
        let mut db = lock(&db);

        let matches = db.find_by_term(unique_term);
        match matches.split_first() {
            Some((first, rest)) => {
                for docid in rest {
                    db.docs.remove(docid);
                }
                db.docs.insert(*first, doc);
                Ok(*first)
            }
            None => {
                db.last_docid += 1;
                let docid = db.last_docid;
                db.docs.insert(docid, doc);
                Ok(docid)
            }
        }
    }

    fn database_delete_document(&self, db: RawHandle, unique_term: &str) -> NativeResult<()> {
        let state = self.begin()?;
        let db = state.writable(db)?;
        let mut db = lock(&db);
        for docid in db.find_by_term(unique_term) {
            db.docs.remove(&docid);
        }
        Ok(())
    }

    fn database_commit(&self, db: RawHandle) -> NativeResult<()> {
        let state = self.begin()?;
        lock(&*(state.writable(db)?)).commits += 1;
        Ok(())
    }

    fn stem_new(&self, language: &str) -> NativeResult<RawHandle> {
        let mut state = self.begin()?;
        let language = language.to_lowercase();
        let stemmer = match language.as_str() {
            "" | "none" => None,
            "en" => Some("english".to_string()),
            lang if KNOWN_LANGUAGES.contains(&lang) => Some(language.clone()),
            _ => {
                return Err(NativeFailure::with_kind(
                    "InvalidArgumentError",
                    format!("Language code {} unknown", language),
                ))
            }
        };
        Ok(state.insert(Object::Stem(stemmer)))
    }

    fn stem_apply(&self, stem: RawHandle, word: &str) -> NativeResult<String> {
        let state = self.begin()?;
        Ok(match state.stem(stem)? {
            Some(_) => stem_word(word),
            None => word.to_string(),
        })
    }

    fn stem_description(&self, stem: RawHandle) -> NativeResult<String> {
        let state = self.begin()?;
        Ok(match state.stem(stem)? {
            Some(language) => format!("Xapian::Stem({})", language),
            None => "Xapian::Stem(none)".to_string(),
        })
    }

    fn termgen_new(&self) -> NativeResult<RawHandle> {
        let mut state = self.begin()?;
        Ok(state.insert(Object::TermGenerator {
            stemmer: None,
            doc: None,
            termpos: 0,
        }))
    }

    fn termgen_set_stemmer(&self, termgen: RawHandle, stem: RawHandle) -> NativeResult<()> {
        let mut state = self.begin()?;
        let language = state.stem(stem)?;
        match state.get_mut(termgen)? {
            Object::TermGenerator { stemmer, .. } => {
                *stemmer = language;
                Ok(())
            }
            other => Err(wrong_kind(HandleKind::TermGenerator, other)),
        }
    }

    fn termgen_set_document(&self, termgen: RawHandle, doc: RawHandle) -> NativeResult<()> {
        let mut state = self.begin()?;
        let new_doc = state.doc(doc)?;
        match state.get_mut(termgen)? {
            Object::TermGenerator { doc, termpos, .. } => {
                *doc = Some(new_doc);
                *termpos = 0;
                Ok(())
            }
            other => Err(wrong_kind(HandleKind::TermGenerator, other)),
        }
    }

    fn termgen_index_text(
        &self,
        termgen: RawHandle,
        text: &str,
        wdf_inc: u32,
        prefix: &str,
    ) -> NativeResult<()> {
        let mut state = self.begin()?;
        match state.get_mut(termgen)? {
            Object::TermGenerator {
                stemmer,
                doc,
                termpos,
            } => {
                let doc = doc.as_ref().ok_or_else(|| {
                    NativeFailure::with_kind(
                        "InvalidOperationError",
                        "TermGenerator::index_text() called without a document",
                    )
                })?;
                let mut doc = lock(doc);
                for word in text
                    .split(|c: char| !c.is_alphanumeric())
                    .filter(|w| !w.is_empty())
                {
                    let word = word.to_lowercase();
                    *termpos += 1;
                    doc.add_term(&format!("{}{}", prefix, word), wdf_inc, Some(*termpos));
                    if stemmer.is_some() {
                        doc.add_term(&format!("Z{}{}", prefix, stem_word(&word)), wdf_inc, None);
                    }
                }
                Ok(())
            }
            other => Err(wrong_kind(HandleKind::TermGenerator, other)),
        }
    }

    fn termgen_increase_termpos(&self, termgen: RawHandle, delta: u32) -> NativeResult<()> {
        let mut state = self.begin()?;
        match state.get_mut(termgen)? {
            Object::TermGenerator { termpos, .. } => {
                *termpos += delta;
                Ok(())
            }
            other => Err(wrong_kind(HandleKind::TermGenerator, other)),
        }
    }

    fn termgen_get_termpos(&self, termgen: RawHandle) -> NativeResult<u32> {
        let state = self.begin()?;
        match state.get(termgen)? {
            Object::TermGenerator { termpos, .. } => Ok(*termpos),
            other => Err(wrong_kind(HandleKind::TermGenerator, other)),
        }
    }

    fn query_term(&self, term: &str, wqf: u32, pos: u32) -> NativeResult<RawHandle> {
        let mut state = self.begin()?;
        Ok(state.insert(Object::Query(MockQuery::Term {
            term: term.to_string(),
            wqf,
            pos,
        })))
    }

    fn query_combine(
        &self,
        op: QueryOp,
        subqueries: &[RawHandle],
        _parameter: u32,
    ) -> NativeResult<RawHandle> {
        let mut state = self.begin()?;
        if !op.is_combining() {
            return Err(NativeFailure::with_kind(
                "InvalidArgumentError",
                format!("{} does not combine subqueries", op),
            ));
        }
        let subqueries = subqueries
            .iter()
            .map(|handle| state.query(*handle))
            .collect::<NativeResult<Vec<_>>>()?;
        Ok(state.insert(Object::Query(combine(op, subqueries))))
    }

    fn query_value_range(
        &self,
        op: QueryOp,
        slot: u32,
        lo: &[u8],
        hi: &[u8],
    ) -> NativeResult<RawHandle> {
        let mut state = self.begin()?;
        if op.is_combining() {
            return Err(NativeFailure::with_kind(
                "InvalidArgumentError",
                format!("{} is not a value operator", op),
            ));
        }
        Ok(state.insert(Object::Query(MockQuery::Value {
            op,
            slot,
            lo: lo.to_vec(),
            hi: hi.to_vec(),
        })))
    }

    fn query_match_nothing(&self) -> NativeResult<RawHandle> {
        let mut state = self.begin()?;
        Ok(state.insert(Object::Query(MockQuery::MatchNothing)))
    }

    fn query_description(&self, query: RawHandle) -> NativeResult<String> {
        let state = self.begin()?;
        Ok(state.query(query)?.description())
    }

    fn queryparser_new(&self) -> NativeResult<RawHandle> {
        let mut state = self.begin()?;
        Ok(state.insert(Object::QueryParser(MockParser::default())))
    }

    fn queryparser_set_stemmer(&self, qp: RawHandle, stem: RawHandle) -> NativeResult<()> {
        let mut state = self.begin()?;
        let language = state.stem(stem)?;
        state.parser(qp)?.stemmer = language;
        Ok(())
    }

    fn queryparser_set_stemming_strategy(
        &self,
        qp: RawHandle,
        strategy: StemStrategy,
    ) -> NativeResult<()> {
        let mut state = self.begin()?;
        state.parser(qp)?.strategy = strategy;
        Ok(())
    }

    fn queryparser_set_default_op(&self, qp: RawHandle, op: QueryOp) -> NativeResult<()> {
        let mut state = self.begin()?;
        if !matches!(
            op,
            QueryOp::And | QueryOp::Or | QueryOp::Near | QueryOp::Phrase | QueryOp::EliteSet
                | QueryOp::Synonym | QueryOp::Max
        ) {
            return Err(NativeFailure::with_kind(
                "InvalidArgumentError",
                format!("{} is not a valid default operator", op),
            ));
        }
        state.parser(qp)?.default_op = op;
        Ok(())
    }

    fn queryparser_set_database(&self, qp: RawHandle, db: RawHandle) -> NativeResult<()> {
        let mut state = self.begin()?;
        state.database(db)?;
        state.parser(qp)?;
        Ok(())
    }

    fn queryparser_add_prefix(&self, qp: RawHandle, field: &str, prefix: &str) -> NativeResult<()> {
        let mut state = self.begin()?;
        state
            .parser(qp)?
            .prefixes
            .insert(field.to_string(), prefix.to_string());
        Ok(())
    }

    fn queryparser_add_boolean_prefix(
        &self,
        qp: RawHandle,
        field: &str,
        prefix: &str,
    ) -> NativeResult<()> {
        let mut state = self.begin()?;
        state
            .parser(qp)?
            .boolean_prefixes
            .insert(field.to_string(), prefix.to_string());
        Ok(())
    }

    fn queryparser_parse_query(
        &self,
        qp: RawHandle,
        text: &str,
        _flags: u32,
    ) -> NativeResult<RawHandle> {
        let mut state = self.begin()?;
        let query = state.parser(qp)?.parse(text)?;
        Ok(state.insert(Object::Query(query)))
    }

    fn enquire_new(&self, db: RawHandle) -> NativeResult<RawHandle> {
        let mut state = self.begin()?;
        let db = state.database(db)?;
        Ok(state.insert(Object::Enquire { db, query: None }))
    }

    fn enquire_set_query(&self, enquire: RawHandle, query: RawHandle) -> NativeResult<()> {
        let mut state = self.begin()?;
        let new_query = state.query(query)?;
        match state.get_mut(enquire)? {
            Object::Enquire { query, .. } => {
                *query = Some(new_query);
                Ok(())
            }
            other => Err(wrong_kind(HandleKind::Enquire, other)),
        }
    }

    fn enquire_set_sort_by_relevance(&self, enquire: RawHandle) -> NativeResult<()> {
        let state = self.begin()?;
        match state.get(enquire)? {
            Object::Enquire { .. } => Ok(()),
            other => Err(wrong_kind(HandleKind::Enquire, other)),
        }
    }

    fn enquire_get_mset(
        &self,
        enquire: RawHandle,
        offset: u32,
        pagesize: u32,
    ) -> NativeResult<RawHandle> {
        let mut state = self.begin()?;
        let (db, query) = match state.get(enquire)? {
            Object::Enquire { db, query } => (db.clone(), query.clone()),
            other => return Err(wrong_kind(HandleKind::Enquire, other)),
        };
        let query = query.ok_or_else(|| {
            NativeFailure::with_kind("InvalidArgumentError", "You must set a query before calling get_mset()")
        })?;

        let mut matches: Vec<(DocId, f64, MockDoc)> = lock(&db)
            .docs
            .iter()
            .filter_map(|(docid, doc)| query.weight(doc).map(|w| (*docid, w, doc.clone())))
            .collect();
        matches.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));

        let estimated = matches.len() as u32;
        let max_weight = matches.first().map(|m| m.1).unwrap_or(0.0);
        let items = matches
            .into_iter()
            .enumerate()
            .skip(offset as usize)
            .take(pagesize as usize)
            .map(|(rank, (docid, weight, doc))| {
                let percent = if max_weight > 0.0 {
                    (weight / max_weight * 100.0).round() as i32
                } else {
                    100
                };
                let item = MatchItem {
                    docid,
                    rank: rank as u32,
                    weight,
                    percent,
                };
                (item, doc)
            })
            .collect();

        Ok(state.insert(Object::MSet(MockMSet {
            items,
            estimated,
            db,
        })))
    }

    fn mset_size(&self, mset: RawHandle) -> NativeResult<u32> {
        let state = self.begin()?;
        Ok(state.mset(mset)?.items.len() as u32)
    }

    fn mset_matches_estimated(&self, mset: RawHandle) -> NativeResult<u32> {
        let state = self.begin()?;
        Ok(state.mset(mset)?.estimated)
    }

    fn mset_item(&self, mset: RawHandle, index: u32) -> NativeResult<MatchItem> {
        let state = self.begin()?;
        state
            .mset(mset)?
            .items
            .get(index as usize)
            .map(|(item, _)| *item)
            .ok_or_else(|| NativeFailure::with_kind("RangeError", "MSet index out of range"))
    }

    fn mset_document(&self, mset: RawHandle, index: u32) -> NativeResult<RawHandle> {
        let mut state = self.begin()?;
        let doc = state
            .mset(mset)?
            .items
            .get(index as usize)
            .map(|(_, doc)| doc.clone())
            .ok_or_else(|| NativeFailure::with_kind("RangeError", "MSet index out of range"))?;
        Ok(state.insert(Object::Document(Arc::new(Mutex::new(doc)))))
    }

    fn mset_termfreq(&self, mset: RawHandle, term: &str) -> NativeResult<u32> {
        let state = self.begin()?;
        let freq = lock(&state.mset(mset)?.db).termfreq(term);
        Ok(freq)
    }

    fn mset_description(&self, mset: RawHandle) -> NativeResult<String> {
        let state = self.begin()?;
        let mset = state.mset(mset)?;
        let first = mset.items.first().map(|(item, _)| item.rank).unwrap_or(0);
        Ok(format!(
            "Xapian::MSet(firstitem={}, size={}, matches_estimated={})",
            first,
            mset.items.len(),
            mset.estimated
        ))
    }

    fn mset_sort_by_relevance(&self, mset: RawHandle) -> NativeResult<()> {
        let mut state = self.begin()?;
        match state.get_mut(mset)? {
            Object::MSet(mset) => {
                mset.items.sort_by(|a, b| {
                    b.0.weight
                        .total_cmp(&a.0.weight)
                        .then(a.0.docid.cmp(&b.0.docid))
                });
                Ok(())
            }
            other => Err(wrong_kind(HandleKind::MSet, other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fail_next_is_consumed_once() {
        let engine = MockEngine::new();
        engine.fail_next("DatabaseLockError: busy");
        let err = engine.document_new().unwrap_err();
        assert_eq!(err.kind(), "DatabaseLockError");
        assert!(engine.document_new().is_ok());
    }

    #[test]
    fn test_release_accounting() {
        let engine = MockEngine::new();
        let doc = engine.document_new().unwrap();
        engine.release(HandleKind::Document, doc);
        engine.release(HandleKind::Document, doc);
        assert_eq!(engine.release_count(HandleKind::Document), 1);
        assert_eq!(engine.invalid_releases(), 1);
    }

    #[test]
    fn test_writer_lock_is_exclusive() {
        let engine = MockEngine::new();
        let path = Path::new("/mock/db");
        let first = engine
            .writable_database_open(path, OpenMode::CreateOrOpen)
            .unwrap();
        let err = engine
            .writable_database_open(path, OpenMode::CreateOrOpen)
            .unwrap_err();
        assert_eq!(err.kind(), "DatabaseLockError");

        engine.release(HandleKind::WritableDatabase, first);
        assert!(engine
            .writable_database_open(path, OpenMode::CreateOrOpen)
            .is_ok());
    }
}
