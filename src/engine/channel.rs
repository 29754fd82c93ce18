use std::any::Any;

use tokio::sync::oneshot;

use crate::binding::BoundStatement;
use crate::error::D1Error;
use crate::sql::SqlStatement;

use super::{BatchOutput, ExecOutput, StatementOutput};

pub(super) type BoxedResponse = Result<Box<dyn Any + Send>, D1Error>;
pub(super) type BoxedCallback = Box<dyn FnOnce(&mut rusqlite::Connection) -> BoxedResponse + Send>;

pub(super) enum Command {
    Execute {
        statement: BoundStatement,
        respond_to: oneshot::Sender<Result<(StatementOutput, u64), D1Error>>,
    },
    Batch {
        statements: Vec<BoundStatement>,
        respond_to: oneshot::Sender<Result<BatchOutput, D1Error>>,
    },
    Exec {
        statements: Vec<SqlStatement>,
        respond_to: oneshot::Sender<Result<ExecOutput, D1Error>>,
    },
    WithConnection {
        callback: BoxedCallback,
        respond_to: oneshot::Sender<BoxedResponse>,
    },
    Shutdown,
}
