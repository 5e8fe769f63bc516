/// Submodule defining the `/hello` command.
pub(crate) mod hello;
/// Submodule defining the `/question` command.
pub(crate) mod question;
