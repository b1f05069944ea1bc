//! Built-in transformers applied unconditionally by entity kind before
//! (or instead of) DAG node-based routing: code files always go through
//! the code chunker (and optional summarizer), regular files through
//! the file chunker, and generic chunks through the field chunker.

pub mod code_chunker;
pub mod code_summarizer;
pub mod embedder;
pub mod field_chunker;
pub mod file_chunker;

pub use code_chunker::CodeChunker;
pub use code_summarizer::CodeSummarizer;
pub use embedder::Embedder;
pub use field_chunker::FieldChunker;
pub use file_chunker::FileChunker;
