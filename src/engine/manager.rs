use std::sync::mpsc::{self, Sender};
use std::thread;

use tokio::sync::oneshot;

use crate::binding::BoundStatement;
use crate::error::D1Error;
use crate::sql::SqlStatement;

use super::channel::{BoxedCallback, Command};
use super::dispatcher::run_engine_worker;
use super::{BatchOutput, ExecOutput, StatementOutput};

pub(super) struct EngineWorker {
    sender: Sender<Command>,
}

impl EngineWorker {
    pub(super) fn spawn(conn: rusqlite::Connection, name: &str) -> Result<Self, D1Error> {
        let (sender, receiver) = mpsc::channel::<Command>();
        thread::Builder::new()
            .name(format!("d1-worker-{name}"))
            .spawn(move || run_engine_worker(conn, &receiver))
            .map_err(|err| {
                D1Error::connection(format!("failed to spawn engine worker thread: {err}"))
            })?;

        Ok(Self { sender })
    }

    pub(super) fn send_command(&self, command: Command) -> Result<(), D1Error> {
        self.sender
            .send(command)
            .map_err(|_| D1Error::connection("engine worker closed"))
    }

    async fn request<T>(
        &self,
        build: impl FnOnce(oneshot::Sender<Result<T, D1Error>>) -> Command,
        drop_message: &'static str,
    ) -> Result<T, D1Error> {
        let (tx, rx) = oneshot::channel();
        self.send_command(build(tx))?;
        rx.await.map_err(|_| D1Error::connection(drop_message))?
    }

    pub(super) async fn execute(
        &self,
        statement: BoundStatement,
    ) -> Result<(StatementOutput, u64), D1Error> {
        self.request(
            |respond_to| Command::Execute {
                statement,
                respond_to,
            },
            "engine worker dropped while executing statement",
        )
        .await
    }

    pub(super) async fn batch(
        &self,
        statements: Vec<BoundStatement>,
    ) -> Result<BatchOutput, D1Error> {
        self.request(
            |respond_to| Command::Batch {
                statements,
                respond_to,
            },
            "engine worker dropped while executing batch",
        )
        .await
    }

    pub(super) async fn exec(&self, statements: Vec<SqlStatement>) -> Result<ExecOutput, D1Error> {
        self.request(
            |respond_to| Command::Exec {
                statements,
                respond_to,
            },
            "engine worker dropped while executing script",
        )
        .await
    }

    pub(super) async fn with_connection<F, R>(&self, func: F) -> Result<R, D1Error>
    where
        F: FnOnce(&mut rusqlite::Connection) -> Result<R, D1Error> + Send + 'static,
        R: Send + 'static,
    {
        let (tx, rx) = oneshot::channel();
        let callback: BoxedCallback = Box::new(move |conn| {
            func(conn).map(|value| Box::new(value) as Box<dyn std::any::Any + Send>)
        });
        self.send_command(Command::WithConnection {
            callback,
            respond_to: tx,
        })?;
        match rx.await {
            Ok(Ok(payload)) => payload
                .downcast::<R>()
                .map(|boxed| *boxed)
                .map_err(|_| D1Error::connection("engine worker response downcast failure")),
            Ok(Err(err)) => Err(err),
            Err(_) => Err(D1Error::connection(
                "engine worker dropped while handling custom callback",
            )),
        }
    }
}

impl Drop for EngineWorker {
    fn drop(&mut self) {
        let _ = self.sender.send(Command::Shutdown);
    }
}
