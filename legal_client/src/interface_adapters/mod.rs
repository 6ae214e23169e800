// Interface adapters: wire protocol, HTTP transport and credential storage.

pub mod clients;
pub mod protocol;
pub mod storage;
