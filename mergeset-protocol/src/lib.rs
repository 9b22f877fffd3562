//! Wire types shared between the mergeset reconciliation engine and its
//! collaborators: the binary codec, the front-end that issues change
//! requests, and anything that consumes the patches the engine produces.
//!
//! Nothing in this crate does any reconciliation; it just defines the
//! vocabulary (`OpId`, `Key`, `Change`, `Patch`, ...) that the backend crate
//! operates on.

mod actor_id;
mod change;
mod change_hash;
mod element_id;
mod error;
mod key;
mod obj_type;
mod object_id;
mod op;
mod op_id;
mod request;
mod patch;
mod value;

pub use actor_id::ActorId;
pub use change::Change;
pub use change_hash::ChangeHash;
pub use element_id::ElementId;
pub use error::{InvalidChangeHash, InvalidElementId, InvalidObjectId, InvalidOpId};
pub use key::Key;
pub use obj_type::ObjType;
pub use object_id::ObjectId;
pub use op::{Op, OpType};
pub use op_id::OpId;
pub use patch::{Diff, DiffEdit, MapDiff, OpIdToDiff, Patch, SeqDiff};
pub use request::{ChangeRequest, ReqOpType, RequestKey, RequestOp, RequestType};
pub use value::ScalarValue;
