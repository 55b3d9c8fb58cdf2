pub(crate) mod bootstrap;
pub(crate) mod chat;
pub(crate) mod loop_runner;
pub(crate) mod render;
pub(crate) mod town;
pub(crate) mod world;
