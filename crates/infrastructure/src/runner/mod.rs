pub mod local_shell;

pub use local_shell::LocalShellRunner;
