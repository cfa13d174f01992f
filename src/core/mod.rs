pub mod error;
pub mod file_system;
pub mod filter;
pub mod ignore;
pub mod packer;
pub mod pattern;
pub mod pins;
pub mod progress;
pub mod search;
pub mod selection;
pub mod session;
pub mod tree;
pub mod tree_generator;
pub mod walker;

pub use error::CoreError;
pub use file_system::{FileSystem, OsFileSystem};
pub use filter::{FilterEngine, FilterSummary};
pub use ignore::IgnoreFilter;
pub use packer::{GeneratedPart, PackRequest, PartPacker};
pub use pattern::GitignorePattern;
pub use pins::PinSet;
pub use progress::{CancellationToken, ChannelProgress, ProgressEvent, ProgressSink};
pub use search::{SearchEngine, SearchOptions, SearchResult};
pub use session::ProjectSession;
pub use tree::{FileTree, FileTreeNode, NodeId};
pub use tree_generator::{StructureMode, TreeGenerator};
