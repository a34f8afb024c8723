pub mod completion;
pub mod file_store;
pub mod pg_store;
pub mod upload;

pub use completion::AnthropicCompletionAdapter;
pub use file_store::FileStore;
pub use pg_store::PgKvStore;
pub use upload::UploadedFile;
