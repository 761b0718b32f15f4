//! JSON-RPC and MCP error codes.

/// Invalid JSON was received.
pub const PARSE_ERROR: i32 = -32700;

/// The JSON sent is not a valid Request object.
pub const INVALID_REQUEST: i32 = -32600;

/// The method does not exist.
pub const METHOD_NOT_FOUND: i32 = -32601;

/// Invalid method parameters.
pub const INVALID_PARAMS: i32 = -32602;

/// Internal JSON-RPC error.
pub const INTERNAL_ERROR: i32 = -32603;

/// Start of the implementation-defined server error range.
pub const SERVER_ERROR_START: i32 = -32000;

/// End of the implementation-defined server error range.
pub const SERVER_ERROR_END: i32 = -32099;

/// The user declined the operation (e.g. a sampling request).
pub const USER_REJECTED: i32 = -1;

/// Resource was not found.
pub const RESOURCE_NOT_FOUND: i32 = -32002;
