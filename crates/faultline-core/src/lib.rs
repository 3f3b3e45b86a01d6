pub mod chunk;
pub mod context;
pub mod errors;
pub mod failure;
pub mod ids;
pub mod occurrence;

pub use chunk::{Chunk, ChunkEncoder, Chunks, Marker, DEFAULT_WRAP_LEN};
pub use context::{
    extract, ChannelRef, CommandInvocation, CommandRef, ContextDetails, GuildRef, Interaction,
    InvocationContext, MessageRef, Metadata, UserRef, NO_COMMAND,
};
pub use errors::ConfigError;
pub use failure::{fingerprint, Failure};
pub use ids::OccurrenceId;
pub use occurrence::Occurrence;
