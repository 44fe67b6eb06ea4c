//! [`NativeApi`] over the compiled C ABI bridge, loaded at runtime.

use std::ffi::{c_char, c_int, c_void, CStr};
use std::path::{Path, PathBuf};
use std::ptr;

use libloading::Library;
use thiserror::Error;

use super::{
    DocId, HandleKind, MatchItem, NativeApi, NativeFailure, NativeResult, OpenMode, QueryOp,
    RawHandle, StemStrategy,
};

/// Failure to load the bridge library.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to load bridge library {}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: libloading::Error,
    },

    #[error("bridge library {} has no symbol `{symbol}`", path.display())]
    Symbol {
        path: PathBuf,
        symbol: &'static str,
        #[source]
        source: libloading::Error,
    },
}

type Out = *mut c_void;
type ErrOut = *mut *mut c_char;

macro_rules! bridge_symbols {
    ($($name:ident: fn($($arg:ty),*) $(-> $ret:ty)?;)*) => {
        struct Symbols {
            $($name: unsafe extern "C" fn($($arg),*) $(-> $ret)?,)*
        }

        impl Symbols {
            /// Resolve every bridge symbol.
            ///
            /// # Safety
            /// The library must export the symbols with the declared signatures.
            unsafe fn resolve(library: &Library, path: &Path) -> Result<Self, LoadError> {
                Ok(Symbols {
                    $($name: {
                        let name = concat!("xb_", stringify!($name));
                        let symbol = library
                            .get::<unsafe extern "C" fn($($arg),*) $(-> $ret)?>(
                                concat!("xb_", stringify!($name), "\0").as_bytes(),
                            )
                            .map_err(|source| LoadError::Symbol {
                                path: path.to_path_buf(),
                                symbol: name,
                                source,
                            })?;
                        *symbol
                    },)*
                })
            }
        }
    };
}

bridge_symbols! {
    version: fn(*mut *mut c_char, *mut usize, ErrOut) -> c_int;
    string_free: fn(*mut c_char);
    release: fn(c_int, Out);

    document_new: fn(*mut Out, ErrOut) -> c_int;
    document_set_data: fn(Out, *const c_char, usize, ErrOut) -> c_int;
    document_get_data: fn(Out, *mut *mut c_char, *mut usize, ErrOut) -> c_int;
    document_add_term: fn(Out, *const c_char, usize, u32, ErrOut) -> c_int;
    document_add_posting: fn(Out, *const c_char, usize, u32, u32, ErrOut) -> c_int;
    document_add_boolean_term: fn(Out, *const c_char, usize, ErrOut) -> c_int;
    document_add_value: fn(Out, u32, *const c_char, usize, ErrOut) -> c_int;
    document_terms: fn(Out, *mut *mut c_char, *mut usize, ErrOut) -> c_int;

    database_open: fn(*const c_char, usize, *mut Out, ErrOut) -> c_int;
    writable_database_open: fn(*const c_char, usize, c_int, *mut Out, ErrOut) -> c_int;
    database_doccount: fn(Out, *mut u32, ErrOut) -> c_int;
    database_termfreq: fn(Out, *const c_char, usize, *mut u32, ErrOut) -> c_int;
    database_get_document: fn(Out, u32, *mut Out, ErrOut) -> c_int;
    database_close: fn(Out, ErrOut) -> c_int;
    database_add_document: fn(Out, Out, *mut u32, ErrOut) -> c_int;
    database_replace_document: fn(Out, *const c_char, usize, Out, *mut u32, ErrOut) -> c_int;
    database_delete_document: fn(Out, *const c_char, usize, ErrOut) -> c_int;
    database_commit: fn(Out, ErrOut) -> c_int;

    stem_new: fn(*const c_char, usize, *mut Out, ErrOut) -> c_int;
    stem_apply: fn(Out, *const c_char, usize, *mut *mut c_char, *mut usize, ErrOut) -> c_int;
    stem_description: fn(Out, *mut *mut c_char, *mut usize, ErrOut) -> c_int;

    termgen_new: fn(*mut Out, ErrOut) -> c_int;
    termgen_set_stemmer: fn(Out, Out, ErrOut) -> c_int;
    termgen_set_document: fn(Out, Out, ErrOut) -> c_int;
    termgen_index_text: fn(Out, *const c_char, usize, u32, *const c_char, usize, ErrOut) -> c_int;
    termgen_increase_termpos: fn(Out, u32, ErrOut) -> c_int;
    termgen_get_termpos: fn(Out, *mut u32, ErrOut) -> c_int;

    query_term: fn(*const c_char, usize, u32, u32, *mut Out, ErrOut) -> c_int;
    query_combine: fn(c_int, *const Out, usize, u32, *mut Out, ErrOut) -> c_int;
    query_value_range: fn(c_int, u32, *const c_char, usize, *const c_char, usize, *mut Out, ErrOut) -> c_int;
    query_match_nothing: fn(*mut Out, ErrOut) -> c_int;
    query_description: fn(Out, *mut *mut c_char, *mut usize, ErrOut) -> c_int;

    queryparser_new: fn(*mut Out, ErrOut) -> c_int;
    queryparser_set_stemmer: fn(Out, Out, ErrOut) -> c_int;
    queryparser_set_stemming_strategy: fn(Out, c_int, ErrOut) -> c_int;
    queryparser_set_default_op: fn(Out, c_int, ErrOut) -> c_int;
    queryparser_set_database: fn(Out, Out, ErrOut) -> c_int;
    queryparser_add_prefix: fn(Out, *const c_char, usize, *const c_char, usize, ErrOut) -> c_int;
    queryparser_add_boolean_prefix: fn(Out, *const c_char, usize, *const c_char, usize, ErrOut) -> c_int;
    queryparser_parse_query: fn(Out, *const c_char, usize, u32, *mut Out, ErrOut) -> c_int;

    enquire_new: fn(Out, *mut Out, ErrOut) -> c_int;
    enquire_set_query: fn(Out, Out, ErrOut) -> c_int;
    enquire_set_sort_by_relevance: fn(Out, ErrOut) -> c_int;
    enquire_get_mset: fn(Out, u32, u32, *mut Out, ErrOut) -> c_int;

    mset_size: fn(Out, *mut u32, ErrOut) -> c_int;
    mset_matches_estimated: fn(Out, *mut u32, ErrOut) -> c_int;
    mset_item: fn(Out, u32, *mut u32, *mut u32, *mut f64, *mut i32, ErrOut) -> c_int;
    mset_document: fn(Out, u32, *mut Out, ErrOut) -> c_int;
    mset_termfreq: fn(Out, *const c_char, usize, *mut u32, ErrOut) -> c_int;
    mset_description: fn(Out, *mut *mut c_char, *mut usize, ErrOut) -> c_int;
    mset_sort_by_relevance: fn(Out, ErrOut) -> c_int;
}

/// The compiled bridge, loaded from a shared library.
pub struct BridgeLibrary {
    path: PathBuf,
    symbols: Symbols,
    // Must outlive `symbols`.
    _library: Library,
}

impl BridgeLibrary {
    /// Load the bridge shared library and resolve all of its symbols.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, LoadError> {
        let path = path.as_ref().to_path_buf();

        // SAFETY: loading runs the library's static initializers; the bridge
        // and libxapian have no initializers with preconditions.
        let library = unsafe { Library::new(&path) }.map_err(|source| LoadError::Open {
            path: path.clone(),
            source,
        })?;

        // SAFETY: the symbol table mirrors bridge/xapian_bridge.h.
        let symbols = unsafe { Symbols::resolve(&library, &path)? };

        tracing::debug!("loaded bridge library {}", path.display());

        Ok(BridgeLibrary {
            path,
            symbols,
            _library: library,
        })
    }

    /// Path the library was loaded from.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn invoke(&self, call: impl FnOnce(ErrOut) -> c_int) -> NativeResult<()> {
        let mut err: *mut c_char = ptr::null_mut();
        let rc = call(&mut err);
        if rc == 0 {
            return Ok(());
        }

        let payload = if err.is_null() {
            "UnknownError: native call failed without a message".to_string()
        } else {
            // SAFETY: the bridge hands out NUL-terminated heap strings.
            let text = unsafe { CStr::from_ptr(err) }.to_string_lossy().into_owned();
            unsafe { (self.symbols.string_free)(err) };
            text
        };
        Err(NativeFailure::new(payload))
    }

    fn new_handle(&self, call: impl FnOnce(*mut Out, ErrOut) -> c_int) -> NativeResult<RawHandle> {
        let mut out: Out = ptr::null_mut();
        self.invoke(|err| call(&mut out, err))?;
        if out.is_null() {
            return Err(NativeFailure::with_kind(
                "InternalError",
                "bridge returned a null handle",
            ));
        }
        Ok(RawHandle::from_raw(out as usize))
    }

    fn u32_out(&self, call: impl FnOnce(*mut u32, ErrOut) -> c_int) -> NativeResult<u32> {
        let mut out = 0u32;
        self.invoke(|err| call(&mut out, err))?;
        Ok(out)
    }

    fn bytes_out(
        &self,
        call: impl FnOnce(*mut *mut c_char, *mut usize, ErrOut) -> c_int,
    ) -> NativeResult<Vec<u8>> {
        let mut out: *mut c_char = ptr::null_mut();
        let mut len = 0usize;
        self.invoke(|err| call(&mut out, &mut len, err))?;
        if out.is_null() {
            return Ok(Vec::new());
        }
        // SAFETY: the bridge allocated `len` bytes at `out`.
        let bytes = unsafe { std::slice::from_raw_parts(out as *const u8, len) }.to_vec();
        unsafe { (self.symbols.string_free)(out) };
        Ok(bytes)
    }

    fn string_out(
        &self,
        call: impl FnOnce(*mut *mut c_char, *mut usize, ErrOut) -> c_int,
    ) -> NativeResult<String> {
        let bytes = self.bytes_out(call)?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }
}

fn ptr_of(handle: RawHandle) -> Out {
    handle.as_raw() as Out
}

fn text(s: &str) -> (*const c_char, usize) {
    (s.as_ptr() as *const c_char, s.len())
}

fn blob(b: &[u8]) -> (*const c_char, usize) {
    (b.as_ptr() as *const c_char, b.len())
}

fn path_bytes(path: &Path) -> &[u8] {
    path.as_os_str().as_encoded_bytes()
}

/// Decode the `(u32 little-endian length, bytes)*` term list encoding.
fn decode_terms(encoded: &[u8]) -> NativeResult<Vec<String>> {
    let mut terms = Vec::new();
    let mut rest = encoded;
    while !rest.is_empty() {
        if rest.len() < 4 {
            return Err(NativeFailure::with_kind(
                "SerialisationError",
                "truncated term list length",
            ));
        }
        let (len_bytes, tail) = rest.split_at(4);
        let len = u32::from_le_bytes([len_bytes[0], len_bytes[1], len_bytes[2], len_bytes[3]])
            as usize;
        if tail.len() < len {
            return Err(NativeFailure::with_kind(
                "SerialisationError",
                "truncated term list entry",
            ));
        }
        let (term, tail) = tail.split_at(len);
        terms.push(String::from_utf8_lossy(term).into_owned());
        rest = tail;
    }
    Ok(terms)
}

impl NativeApi for BridgeLibrary {
    fn version(&self) -> String {
        let s = &self.symbols;
        self.string_out(|out, len, err| unsafe { (s.version)(out, len, err) })
            .unwrap_or_else(|failure| failure.to_string())
    }

    fn release(&self, kind: HandleKind, handle: RawHandle) {
        unsafe { (self.symbols.release)(kind.code(), ptr_of(handle)) }
    }

    fn document_new(&self) -> NativeResult<RawHandle> {
        let s = &self.symbols;
        self.new_handle(|out, err| unsafe { (s.document_new)(out, err) })
    }

    fn document_set_data(&self, doc: RawHandle, data: &[u8]) -> NativeResult<()> {
        let (p, n) = blob(data);
        self.invoke(|err| unsafe { (self.symbols.document_set_data)(ptr_of(doc), p, n, err) })
    }

    fn document_get_data(&self, doc: RawHandle) -> NativeResult<Vec<u8>> {
        let s = &self.symbols;
        self.bytes_out(|out, len, err| unsafe { (s.document_get_data)(ptr_of(doc), out, len, err) })
    }

    fn document_add_term(&self, doc: RawHandle, term: &str, wdf_inc: u32) -> NativeResult<()> {
        let (p, n) = text(term);
        self.invoke(|err| unsafe {
            (self.symbols.document_add_term)(ptr_of(doc), p, n, wdf_inc, err)
        })
    }

    fn document_add_posting(
        &self,
        doc: RawHandle,
        term: &str,
        pos: u32,
        wdf_inc: u32,
    ) -> NativeResult<()> {
        let (p, n) = text(term);
        self.invoke(|err| unsafe {
            (self.symbols.document_add_posting)(ptr_of(doc), p, n, pos, wdf_inc, err)
        })
    }

    fn document_add_boolean_term(&self, doc: RawHandle, term: &str) -> NativeResult<()> {
        let (p, n) = text(term);
        self.invoke(|err| unsafe {
            (self.symbols.document_add_boolean_term)(ptr_of(doc), p, n, err)
        })
    }

    fn document_add_value(&self, doc: RawHandle, slot: u32, value: &[u8]) -> NativeResult<()> {
        let (p, n) = blob(value);
        self.invoke(|err| unsafe {
            (self.symbols.document_add_value)(ptr_of(doc), slot, p, n, err)
        })
    }

    fn document_terms(&self, doc: RawHandle) -> NativeResult<Vec<String>> {
        let s = &self.symbols;
        let encoded =
            self.bytes_out(|out, len, err| unsafe { (s.document_terms)(ptr_of(doc), out, len, err) })?;
        decode_terms(&encoded)
    }

    fn database_open(&self, path: &Path) -> NativeResult<RawHandle> {
        let (p, n) = blob(path_bytes(path));
        let s = &self.symbols;
        self.new_handle(|out, err| unsafe { (s.database_open)(p, n, out, err) })
    }

    fn writable_database_open(&self, path: &Path, mode: OpenMode) -> NativeResult<RawHandle> {
        let (p, n) = blob(path_bytes(path));
        let s = &self.symbols;
        self.new_handle(|out, err| unsafe {
            (s.writable_database_open)(p, n, mode.code(), out, err)
        })
    }

    fn database_doccount(&self, db: RawHandle) -> NativeResult<u32> {
        let s = &self.symbols;
        self.u32_out(|out, err| unsafe { (s.database_doccount)(ptr_of(db), out, err) })
    }

    fn database_termfreq(&self, db: RawHandle, term: &str) -> NativeResult<u32> {
        let (p, n) = text(term);
        let s = &self.symbols;
        self.u32_out(|out, err| unsafe { (s.database_termfreq)(ptr_of(db), p, n, out, err) })
    }

    fn database_get_document(&self, db: RawHandle, docid: DocId) -> NativeResult<RawHandle> {
        let s = &self.symbols;
        self.new_handle(|out, err| unsafe {
            (s.database_get_document)(ptr_of(db), docid, out, err)
        })
    }

    fn database_close(&self, db: RawHandle) -> NativeResult<()> {
        self.invoke(|err| unsafe { (self.symbols.database_close)(ptr_of(db), err) })
    }

    fn database_add_document(&self, db: RawHandle, doc: RawHandle) -> NativeResult<DocId> {
        let s = &self.symbols;
        self.u32_out(|out, err| unsafe {
            (s.database_add_document)(ptr_of(db), ptr_of(doc), out, err)
        })
    }

    fn database_replace_document(
        &self,
        db: RawHandle,
        unique_term: &str,
        doc: RawHandle,
    ) -> NativeResult<DocId> {
        let (p, n) = text(unique_term);
        let s = &self.symbols;
        self.u32_out(|out, err| unsafe {
            (s.database_replace_document)(ptr_of(db), p, n, ptr_of(doc), out, err)
        })
    }

    fn database_delete_document(&self, db: RawHandle, unique_term: &str) -> NativeResult<()> {
        let (p, n) = text(unique_term);
        self.invoke(|err| unsafe {
            (self.symbols.database_delete_document)(ptr_of(db), p, n, err)
        })
    }

    fn database_commit(&self, db: RawHandle) -> NativeResult<()> {
        self.invoke(|err| unsafe { (self.symbols.database_commit)(ptr_of(db), err) })
    }

    fn stem_new(&self, language: &str) -> NativeResult<RawHandle> {
        let (p, n) = text(language);
        let s = &self.symbols;
        self.new_handle(|out, err| unsafe { (s.stem_new)(p, n, out, err) })
    }

    fn stem_apply(&self, stem: RawHandle, word: &str) -> NativeResult<String> {
        let (p, n) = text(word);
        let s = &self.symbols;
        self.string_out(|out, len, err| unsafe {
            (s.stem_apply)(ptr_of(stem), p, n, out, len, err)
        })
    }

    fn stem_description(&self, stem: RawHandle) -> NativeResult<String> {
        let s = &self.symbols;
        self.string_out(|out, len, err| unsafe {
            (s.stem_description)(ptr_of(stem), out, len, err)
        })
    }

    fn termgen_new(&self) -> NativeResult<RawHandle> {
        let s = &self.symbols;
        self.new_handle(|out, err| unsafe { (s.termgen_new)(out, err) })
    }

    fn termgen_set_stemmer(&self, termgen: RawHandle, stem: RawHandle) -> NativeResult<()> {
        self.invoke(|err| unsafe {
            (self.symbols.termgen_set_stemmer)(ptr_of(termgen), ptr_of(stem), err)
        })
    }

    fn termgen_set_document(&self, termgen: RawHandle, doc: RawHandle) -> NativeResult<()> {
        self.invoke(|err| unsafe {
            (self.symbols.termgen_set_document)(ptr_of(termgen), ptr_of(doc), err)
        })
    }

    fn termgen_index_text(
        &self,
        termgen: RawHandle,
        body: &str,
        wdf_inc: u32,
        prefix: &str,
    ) -> NativeResult<()> {
        let (tp, tn) = text(body);
        let (pp, pn) = text(prefix);
        self.invoke(|err| unsafe {
            (self.symbols.termgen_index_text)(ptr_of(termgen), tp, tn, wdf_inc, pp, pn, err)
        })
    }

    fn termgen_increase_termpos(&self, termgen: RawHandle, delta: u32) -> NativeResult<()> {
        self.invoke(|err| unsafe {
            (self.symbols.termgen_increase_termpos)(ptr_of(termgen), delta, err)
        })
    }

    fn termgen_get_termpos(&self, termgen: RawHandle) -> NativeResult<u32> {
        let s = &self.symbols;
        self.u32_out(|out, err| unsafe { (s.termgen_get_termpos)(ptr_of(termgen), out, err) })
    }

    fn query_term(&self, term: &str, wqf: u32, pos: u32) -> NativeResult<RawHandle> {
        let (p, n) = text(term);
        let s = &self.symbols;
        self.new_handle(|out, err| unsafe { (s.query_term)(p, n, wqf, pos, out, err) })
    }

    fn query_combine(
        &self,
        op: QueryOp,
        subqueries: &[RawHandle],
        parameter: u32,
    ) -> NativeResult<RawHandle> {
        let subs: Vec<Out> = subqueries.iter().copied().map(ptr_of).collect();
        let s = &self.symbols;
        self.new_handle(|out, err| unsafe {
            (s.query_combine)(op.code(), subs.as_ptr(), subs.len(), parameter, out, err)
        })
    }

    fn query_value_range(
        &self,
        op: QueryOp,
        slot: u32,
        lo: &[u8],
        hi: &[u8],
    ) -> NativeResult<RawHandle> {
        let (lp, ln) = blob(lo);
        let (hp, hn) = blob(hi);
        let s = &self.symbols;
        self.new_handle(|out, err| unsafe {
            (s.query_value_range)(op.code(), slot, lp, ln, hp, hn, out, err)
        })
    }

    fn query_match_nothing(&self) -> NativeResult<RawHandle> {
        let s = &self.symbols;
        self.new_handle(|out, err| unsafe { (s.query_match_nothing)(out, err) })
    }

    fn query_description(&self, query: RawHandle) -> NativeResult<String> {
        let s = &self.symbols;
        self.string_out(|out, len, err| unsafe {
            (s.query_description)(ptr_of(query), out, len, err)
        })
    }

    fn queryparser_new(&self) -> NativeResult<RawHandle> {
        let s = &self.symbols;
        self.new_handle(|out, err| unsafe { (s.queryparser_new)(out, err) })
    }

    fn queryparser_set_stemmer(&self, qp: RawHandle, stem: RawHandle) -> NativeResult<()> {
        self.invoke(|err| unsafe {
            (self.symbols.queryparser_set_stemmer)(ptr_of(qp), ptr_of(stem), err)
        })
    }

    fn queryparser_set_stemming_strategy(
        &self,
        qp: RawHandle,
        strategy: StemStrategy,
    ) -> NativeResult<()> {
        self.invoke(|err| unsafe {
            (self.symbols.queryparser_set_stemming_strategy)(ptr_of(qp), strategy.code(), err)
        })
    }

    fn queryparser_set_default_op(&self, qp: RawHandle, op: QueryOp) -> NativeResult<()> {
        self.invoke(|err| unsafe {
            (self.symbols.queryparser_set_default_op)(ptr_of(qp), op.code(), err)
        })
    }

    fn queryparser_set_database(&self, qp: RawHandle, db: RawHandle) -> NativeResult<()> {
        self.invoke(|err| unsafe {
            (self.symbols.queryparser_set_database)(ptr_of(qp), ptr_of(db), err)
        })
    }

    fn queryparser_add_prefix(
        &self,
        qp: RawHandle,
        field: &str,
        prefix: &str,
    ) -> NativeResult<()> {
        let (fp, fn_) = text(field);
        let (pp, pn) = text(prefix);
        self.invoke(|err| unsafe {
            (self.symbols.queryparser_add_prefix)(ptr_of(qp), fp, fn_, pp, pn, err)
        })
    }

    fn queryparser_add_boolean_prefix(
        &self,
        qp: RawHandle,
        field: &str,
        prefix: &str,
    ) -> NativeResult<()> {
        let (fp, fn_) = text(field);
        let (pp, pn) = text(prefix);
        self.invoke(|err| unsafe {
            (self.symbols.queryparser_add_boolean_prefix)(ptr_of(qp), fp, fn_, pp, pn, err)
        })
    }

    fn queryparser_parse_query(
        &self,
        qp: RawHandle,
        body: &str,
        flags: u32,
    ) -> NativeResult<RawHandle> {
        let (p, n) = text(body);
        let s = &self.symbols;
        self.new_handle(|out, err| unsafe {
            (s.queryparser_parse_query)(ptr_of(qp), p, n, flags, out, err)
        })
    }

    fn enquire_new(&self, db: RawHandle) -> NativeResult<RawHandle> {
        let s = &self.symbols;
        self.new_handle(|out, err| unsafe { (s.enquire_new)(ptr_of(db), out, err) })
    }

    fn enquire_set_query(&self, enquire: RawHandle, query: RawHandle) -> NativeResult<()> {
        self.invoke(|err| unsafe {
            (self.symbols.enquire_set_query)(ptr_of(enquire), ptr_of(query), err)
        })
    }

    fn enquire_set_sort_by_relevance(&self, enquire: RawHandle) -> NativeResult<()> {
        self.invoke(|err| unsafe {
            (self.symbols.enquire_set_sort_by_relevance)(ptr_of(enquire), err)
        })
    }

    fn enquire_get_mset(
        &self,
        enquire: RawHandle,
        offset: u32,
        pagesize: u32,
    ) -> NativeResult<RawHandle> {
        let s = &self.symbols;
        self.new_handle(|out, err| unsafe {
            (s.enquire_get_mset)(ptr_of(enquire), offset, pagesize, out, err)
        })
    }

    fn mset_size(&self, mset: RawHandle) -> NativeResult<u32> {
        let s = &self.symbols;
        self.u32_out(|out, err| unsafe { (s.mset_size)(ptr_of(mset), out, err) })
    }

    fn mset_matches_estimated(&self, mset: RawHandle) -> NativeResult<u32> {
        let s = &self.symbols;
        self.u32_out(|out, err| unsafe { (s.mset_matches_estimated)(ptr_of(mset), out, err) })
    }

    fn mset_item(&self, mset: RawHandle, index: u32) -> NativeResult<MatchItem> {
        let mut item = MatchItem {
            docid: 0,
            rank: 0,
            weight: 0.0,
            percent: 0,
        };
        self.invoke(|err| unsafe {
            (self.symbols.mset_item)(
                ptr_of(mset),
                index,
                &mut item.docid,
                &mut item.rank,
                &mut item.weight,
                &mut item.percent,
                err,
            )
        })?;
        Ok(item)
    }

    fn mset_document(&self, mset: RawHandle, index: u32) -> NativeResult<RawHandle> {
        let s = &self.symbols;
        self.new_handle(|out, err| unsafe { (s.mset_document)(ptr_of(mset), index, out, err) })
    }

    fn mset_termfreq(&self, mset: RawHandle, term: &str) -> NativeResult<u32> {
        let (p, n) = text(term);
        let s = &self.symbols;
        self.u32_out(|out, err| unsafe { (s.mset_termfreq)(ptr_of(mset), p, n, out, err) })
    }

    fn mset_description(&self, mset: RawHandle) -> NativeResult<String> {
        let s = &self.symbols;
        self.string_out(|out, len, err| unsafe {
            (s.mset_description)(ptr_of(mset), out, len, err)
        })
    }

    fn mset_sort_by_relevance(&self, mset: RawHandle) -> NativeResult<()> {
        self.invoke(|err| unsafe { (self.symbols.mset_sort_by_relevance)(ptr_of(mset), err) })
    }
}
