//! Well-known standard library members.
//!
//! Only standard library packages that are not part of the load are consulted
//! here; the table covers the error-producing APIs handlers commonly call.

use crate::types::{Signature, TypeDescriptor};

fn int() -> TypeDescriptor {
    TypeDescriptor::basic("int")
}

fn string() -> TypeDescriptor {
    TypeDescriptor::basic("string")
}

fn boolean() -> TypeDescriptor {
    TypeDescriptor::basic("bool")
}

fn bytes() -> TypeDescriptor {
    TypeDescriptor::Slice(Box::new(TypeDescriptor::basic("byte")))
}

fn ptr(package: &str, name: &str) -> TypeDescriptor {
    TypeDescriptor::Pointer(Box::new(TypeDescriptor::named(package, name)))
}

fn func(results: Vec<TypeDescriptor>) -> TypeDescriptor {
    TypeDescriptor::Func(Signature::returning(results))
}

fn with_error(value: TypeDescriptor) -> TypeDescriptor {
    func(vec![value, TypeDescriptor::Error])
}

/// Type of the package-level member `name` of the standard library package
/// `package`: a function type or the type of a variable.
pub(crate) fn member(package: &str, name: &str) -> Option<TypeDescriptor> {
    let ty = match (package, name) {
        ("errors", "New" | "Join" | "Unwrap") => func(vec![TypeDescriptor::Error]),
        ("errors", "Is" | "As") => func(vec![boolean()]),
        ("errors", "ErrUnsupported") => TypeDescriptor::Error,

        ("fmt", "Errorf") => func(vec![TypeDescriptor::Error]),
        ("fmt", "Sprintf" | "Sprint" | "Sprintln") => func(vec![string()]),
        ("fmt", "Printf" | "Println" | "Print" | "Fprintf" | "Fprintln" | "Fprint") => {
            with_error(int())
        }

        ("io", "EOF" | "ErrUnexpectedEOF" | "ErrClosedPipe" | "ErrShortWrite") => {
            TypeDescriptor::Error
        }
        ("io", "ReadAll") => with_error(bytes()),
        ("io", "Copy" | "CopyN") => with_error(TypeDescriptor::basic("int64")),
        ("io", "WriteString" | "ReadFull") => with_error(int()),

        ("io/fs" | "os", "ErrNotExist" | "ErrExist" | "ErrPermission" | "ErrClosed") => {
            TypeDescriptor::Error
        }
        ("os", "Open" | "Create" | "OpenFile") => with_error(ptr("os", "File")),
        ("os", "ReadFile") => with_error(bytes()),
        ("os", "Getwd" | "Hostname" | "MkdirTemp" | "UserHomeDir") => with_error(string()),
        (
            "os",
            "WriteFile" | "Remove" | "RemoveAll" | "Mkdir" | "MkdirAll" | "Chdir" | "Setenv"
            | "Rename" | "Unsetenv",
        ) => func(vec![TypeDescriptor::Error]),
        ("os", "Getenv") => func(vec![string()]),
        ("os", "LookupEnv") => func(vec![string(), boolean()]),

        ("strconv", "Atoi") => with_error(int()),
        ("strconv", "ParseInt") => with_error(TypeDescriptor::basic("int64")),
        ("strconv", "ParseUint") => with_error(TypeDescriptor::basic("uint64")),
        ("strconv", "ParseFloat") => with_error(TypeDescriptor::basic("float64")),
        ("strconv", "ParseBool") => with_error(boolean()),
        ("strconv", "Unquote") => with_error(string()),
        ("strconv", "Itoa" | "Quote" | "FormatInt" | "FormatBool") => func(vec![string()]),

        ("encoding/json", "Marshal" | "MarshalIndent") => with_error(bytes()),
        ("encoding/json", "Unmarshal") => func(vec![TypeDescriptor::Error]),
        ("encoding/json", "NewDecoder") => func(vec![ptr("encoding/json", "Decoder")]),
        ("encoding/json", "NewEncoder") => func(vec![ptr("encoding/json", "Encoder")]),

        ("net/http", "Get" | "Post" | "Head" | "PostForm") => {
            with_error(ptr("net/http", "Response"))
        }
        ("net/http", "NewRequest" | "NewRequestWithContext") => {
            with_error(ptr("net/http", "Request"))
        }
        ("net/http", "ListenAndServe" | "ListenAndServeTLS") => func(vec![TypeDescriptor::Error]),
        ("net/http", "ErrServerClosed" | "ErrNoCookie" | "ErrMissingFile" | "ErrHandlerTimeout") => {
            TypeDescriptor::Error
        }
        ("net/http", "StatusText") => func(vec![string()]),

        ("net/url", "Parse" | "ParseRequestURI") => with_error(ptr("net/url", "URL")),
        ("net/url", "QueryUnescape" | "PathUnescape") => with_error(string()),

        ("time", "Parse" | "ParseInLocation") => with_error(TypeDescriptor::named("time", "Time")),
        ("time", "ParseDuration") => with_error(TypeDescriptor::named("time", "Duration")),
        ("time", "Now") => func(vec![TypeDescriptor::named("time", "Time")]),
        ("time", "Since" | "Until") => func(vec![TypeDescriptor::named("time", "Duration")]),

        ("database/sql", "Open") => with_error(ptr("database/sql", "DB")),
        ("database/sql", "ErrNoRows" | "ErrTxDone" | "ErrConnDone") => TypeDescriptor::Error,

        ("context", "Canceled" | "DeadlineExceeded") => TypeDescriptor::Error,
        ("context", "Background" | "TODO") => func(vec![TypeDescriptor::named("context", "Context")]),
        ("context", "WithCancel" | "WithTimeout" | "WithDeadline") => func(vec![
            TypeDescriptor::named("context", "Context"),
            TypeDescriptor::named("context", "CancelFunc"),
        ]),

        ("strings", "Contains" | "HasPrefix" | "HasSuffix" | "EqualFold" | "ContainsAny") => {
            func(vec![boolean()])
        }
        (
            "strings",
            "TrimSpace" | "ToLower" | "ToUpper" | "Join" | "Replace" | "ReplaceAll" | "TrimPrefix"
            | "TrimSuffix" | "Trim" | "Repeat",
        ) => func(vec![string()]),
        ("strings", "Split" | "Fields" | "SplitN") => {
            func(vec![TypeDescriptor::Slice(Box::new(string()))])
        }
        ("strings", "Index" | "LastIndex" | "Count") => func(vec![int()]),

        _ => return None,
    };
    Some(ty)
}

/// Type of the method `method` on the standard library type `package.name`.
pub(crate) fn method(package: &str, name: &str, method: &str) -> Option<TypeDescriptor> {
    let ty = match (package, name, method) {
        ("io", "Reader", "Read") | ("io", "Writer", "Write") => with_error(int()),
        ("io", "Closer" | "ReadCloser" | "WriteCloser" | "ReadWriteCloser", "Close") => {
            func(vec![TypeDescriptor::Error])
        }
        ("io", "ReadCloser", "Read") => with_error(int()),

        ("os", "File", "Close" | "Sync" | "Chmod") => func(vec![TypeDescriptor::Error]),
        ("os", "File", "Read" | "Write" | "WriteString") => with_error(int()),
        ("os", "File", "Name") => func(vec![string()]),

        ("encoding/json", "Decoder", "Decode") | ("encoding/json", "Encoder", "Encode") => {
            func(vec![TypeDescriptor::Error])
        }

        ("net/http", "Client", "Do" | "Get" | "Post" | "Head") => {
            with_error(ptr("net/http", "Response"))
        }
        ("net/http", "Request", "ParseForm" | "ParseMultipartForm") => {
            func(vec![TypeDescriptor::Error])
        }
        ("net/http", "Request", "Context") => func(vec![TypeDescriptor::named("context", "Context")]),
        ("net/http", "Request", "FormValue") => func(vec![string()]),
        ("net/http", "Server", "ListenAndServe" | "Shutdown" | "Close") => {
            func(vec![TypeDescriptor::Error])
        }
        ("net/http", "ResponseWriter", "Write") => with_error(int()),

        ("database/sql", "DB" | "Tx", "Exec" | "ExecContext") => {
            with_error(TypeDescriptor::named("database/sql", "Result"))
        }
        ("database/sql", "DB" | "Tx", "Query" | "QueryContext") => {
            with_error(ptr("database/sql", "Rows"))
        }
        ("database/sql", "DB" | "Tx", "QueryRow" | "QueryRowContext") => {
            func(vec![ptr("database/sql", "Row")])
        }
        ("database/sql", "DB", "Begin" | "BeginTx") => with_error(ptr("database/sql", "Tx")),
        ("database/sql", "DB", "Ping" | "PingContext" | "Close")
        | ("database/sql", "Tx", "Commit" | "Rollback")
        | ("database/sql", "Row" | "Rows", "Scan" | "Err")
        | ("database/sql", "Rows", "Close") => func(vec![TypeDescriptor::Error]),
        ("database/sql", "Rows", "Next") => func(vec![boolean()]),
        ("database/sql", "Result", "RowsAffected" | "LastInsertId") => {
            with_error(TypeDescriptor::basic("int64"))
        }

        ("context", "Context", "Err") => func(vec![TypeDescriptor::Error]),
        ("context", "Context", "Done") => func(vec![TypeDescriptor::Chan(Box::new(
            TypeDescriptor::Struct(Vec::new()),
        ))]),

        _ => return None,
    };
    Some(ty)
}
