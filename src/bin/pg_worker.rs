//! Runs embedded `PostgreSQL` lifecycle steps for the test cluster.
//!
//! Usage:
//!
//! ```text
//! pg_worker <setup|start|stop> <config-path>
//! ```
//!
//! `config-path` names a JSON `WorkerPayload` written by
//! `pg-embed-setup-unpriv`. `PostgreSQL` refuses to run as the superuser, so
//! a worker started as root re-executes itself as `nobody` first.

/// Boxed error type for the main result.
type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[cfg(unix)]
fn main() -> Result<(), BoxError> {
    worker::run().map_err(Into::into)
}

#[cfg(not(unix))]
fn main() -> Result<(), BoxError> {
    Err("pg_worker is only supported on Unix platforms".into())
}

#[cfg(unix)]
mod worker {
    use camino::Utf8PathBuf;
    use nix::unistd::{Uid, User, initgroups, setgid, setuid};
    use pg_embedded_setup_unpriv::ambient_dir_and_path;
    use pg_embedded_setup_unpriv::worker::{PlainSecret, WorkerPayload};
    use postgresql_embedded::{PostgreSQL, Status};
    use std::env;
    use std::ffi::CString;
    use std::io::{self, Read};
    use std::process::{Command, ExitStatus};
    use thiserror::Error;

    const REEXEC_ENV: &str = "PG_WORKER_REEXEC";
    const TRUSTED_PATH: &str = "/usr/sbin:/usr/bin:/sbin:/bin";
    const UNPRIVILEGED_USER: &str = "nobody";

    /// Failures reported by the worker.
    #[derive(Debug, Error)]
    pub(super) enum WorkerError {
        /// The command line was malformed.
        #[error("usage: pg_worker <setup|start|stop> <config-path> ({0})")]
        Usage(String),
        /// The payload could not be read or decoded.
        #[error("invalid worker config: {0}")]
        Config(String),
        /// Switching to the unprivileged account failed.
        #[error("failed to drop privileges: {0}")]
        Privileges(String),
        /// The async runtime could not be built.
        #[error("failed to build runtime: {0}")]
        Runtime(#[source] io::Error),
        /// A `PostgreSQL` lifecycle call failed.
        #[error("postgres {operation} failed: {message}")]
        Postgres {
            /// Lifecycle step that failed.
            operation: &'static str,
            /// Error reported by `postgresql_embedded`.
            message: String,
        },
    }

    /// Lifecycle step requested on the command line.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub(super) enum Operation {
        Setup,
        Start,
        Stop,
    }

    impl Operation {
        pub(super) fn parse(raw: &str) -> Result<Self, WorkerError> {
            match raw {
                "setup" => Ok(Self::Setup),
                "start" => Ok(Self::Start),
                "stop" => Ok(Self::Stop),
                other => Err(WorkerError::Usage(format!("unknown operation '{other}'"))),
            }
        }

        const fn name(self) -> &'static str {
            match self {
                Self::Setup => "setup",
                Self::Start => "start",
                Self::Stop => "stop",
            }
        }
    }

    /// Parsed command line.
    #[derive(Debug, PartialEq, Eq)]
    pub(super) struct Invocation {
        pub(super) operation: Operation,
        pub(super) config: Utf8PathBuf,
    }

    /// Parses `program operation config-path`.
    pub(super) fn parse_args<I>(args: I) -> Result<Invocation, WorkerError>
    where
        I: IntoIterator<Item = String>,
    {
        let mut rest = args.into_iter().skip(1);
        let operation = rest
            .next()
            .ok_or_else(|| WorkerError::Usage("missing operation".to_owned()))?;
        let config = rest
            .next()
            .ok_or_else(|| WorkerError::Usage("missing config path".to_owned()))?;
        if let Some(extra) = rest.next() {
            return Err(WorkerError::Usage(format!("unexpected argument '{extra}'")));
        }
        Ok(Invocation {
            operation: Operation::parse(&operation)?,
            config: Utf8PathBuf::from(config),
        })
    }

    /// Wraps `value` in single quotes for a POSIX shell.
    pub(super) fn shell_quote(value: &str) -> String {
        format!("'{}'", value.replace('\'', "'\\''"))
    }

    pub(super) fn run() -> Result<(), WorkerError> {
        let args = env::args_os()
            .map(|arg| {
                arg.into_string()
                    .map_err(|_| WorkerError::Usage("arguments must be UTF-8".to_owned()))
            })
            .collect::<Result<Vec<_>, _>>()?;
        let invocation = parse_args(args.iter().cloned())?;

        if Uid::effective().is_root() && env::var_os(REEXEC_ENV).is_none() {
            let status = reexec_unprivileged(&args)?;
            std::process::exit(status.code().unwrap_or(1));
        }

        let payload = load_payload(&invocation.config)?;
        drop_privileges_if_root()?;
        let settings = payload
            .settings
            .into_settings()
            .map_err(|err| WorkerError::Config(err.to_string()))?;
        apply_environment(&payload.environment);

        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(WorkerError::Runtime)?;
        runtime.block_on(perform(invocation.operation, PostgreSQL::new(settings)))
    }

    async fn perform(operation: Operation, mut postgres: PostgreSQL) -> Result<(), WorkerError> {
        let failed = |err: postgresql_embedded::Error| WorkerError::Postgres {
            operation: operation.name(),
            message: err.to_string(),
        };
        match operation {
            Operation::Setup => {
                postgres.setup().await.map_err(failed)?;
                ensure_started(&mut postgres).await.map_err(failed)
            }
            Operation::Start => {
                ensure_started(&mut postgres).await.map_err(failed)?;
                // Dropping the handle stops the server, so keep it alive
                // past the worker's exit.
                let _running = std::mem::ManuallyDrop::new(postgres);
                Ok(())
            }
            Operation::Stop => postgres.stop().await.map_err(failed),
        }
    }

    async fn ensure_started(postgres: &mut PostgreSQL) -> Result<(), postgresql_embedded::Error> {
        if matches!(postgres.status(), Status::Started) {
            return Ok(());
        }
        postgres.start().await
    }

    fn reexec_unprivileged(args: &[String]) -> Result<ExitStatus, WorkerError> {
        let exe = env::current_exe().map_err(|err| WorkerError::Privileges(err.to_string()))?;
        let spawned = Command::new("runuser")
            .args(["-u", UNPRIVILEGED_USER, "--"])
            .arg(&exe)
            .args(args.iter().skip(1))
            .env(REEXEC_ENV, "1")
            .env("PATH", TRUSTED_PATH)
            .status();
        match spawned {
            Ok(status) => Ok(status),
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                let exe_text = exe.to_string_lossy();
                let mut command = format!("{REEXEC_ENV}=1 exec {}", shell_quote(&exe_text));
                for arg in args.iter().skip(1) {
                    command.push(' ');
                    command.push_str(&shell_quote(arg));
                }
                Command::new("/bin/su")
                    .args(["-s", "/bin/sh", UNPRIVILEGED_USER, "-c"])
                    .arg(command)
                    .env("PATH", TRUSTED_PATH)
                    .status()
                    .map_err(|su_err| WorkerError::Privileges(su_err.to_string()))
            }
            Err(err) => Err(WorkerError::Privileges(err.to_string())),
        }
    }

    fn load_payload(path: &camino::Utf8Path) -> Result<WorkerPayload, WorkerError> {
        let config_error = |err: &dyn std::fmt::Display| WorkerError::Config(err.to_string());
        let (dir, relative) = ambient_dir_and_path(path).map_err(|err| config_error(&err))?;
        let mut file = dir
            .open(relative.as_std_path())
            .map_err(|err| config_error(&err))?;
        let mut bytes = Vec::new();
        file.read_to_end(&mut bytes)
            .map_err(|err| config_error(&err))?;
        serde_json::from_slice(&bytes).map_err(|err| config_error(&err))
    }

    fn drop_privileges_if_root() -> Result<(), WorkerError> {
        if !Uid::effective().is_root() {
            return Ok(());
        }
        let privileges = |err: &dyn std::fmt::Display| WorkerError::Privileges(err.to_string());
        let user = User::from_name(UNPRIVILEGED_USER)
            .map_err(|err| privileges(&err))?
            .ok_or_else(|| {
                WorkerError::Privileges(format!("user '{UNPRIVILEGED_USER}' not found"))
            })?;
        let name = CString::new(user.name.clone()).map_err(|err| privileges(&err))?;
        initgroups(&name, user.gid).map_err(|err| privileges(&err))?;
        setgid(user.gid).map_err(|err| privileges(&err))?;
        setuid(user.uid).map_err(|err| privileges(&err))?;

        // SAFETY: the worker is still single-threaded here.
        unsafe {
            env::set_var("HOME", &user.dir);
            env::set_var("USER", &user.name);
            env::set_var("LOGNAME", &user.name);
        }
        Ok(())
    }

    fn apply_environment(environment: &[(String, Option<PlainSecret>)]) {
        for (key, value) in environment {
            // SAFETY: no other thread exists before the runtime is built.
            unsafe {
                match value {
                    Some(secret) => env::set_var(key, secret.expose()),
                    None => env::remove_var(key),
                }
            }
        }
    }
}
