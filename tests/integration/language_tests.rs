use symdex::symbol::{hierarchy, SymbolKind};

use crate::helpers::test_utils::{by_name, extract};

const PYTHON: &str = include_str!("../fixtures/languages/models.py");
const RUST: &str = include_str!("../fixtures/languages/server.rs");
const GO: &str = include_str!("../fixtures/languages/server.go");
const JAVA: &str = include_str!("../fixtures/languages/Greeter.java");
const TYPESCRIPT: &str = include_str!("../fixtures/languages/client.ts");
const JAVASCRIPT: &str = include_str!("../fixtures/languages/util.js");

#[test]
fn test_python_extraction() {
    let symbols = extract("python", "app/models.py", PYTHON);
    let names: Vec<_> = symbols.iter().map(|s| s.qualified_name.as_str()).collect();
    assert_eq!(
        names,
        ["MAX_RETRIES", "User", "User.DEFAULT_ROLE", "User.login", "helper"]
    );

    let max = by_name(&symbols, "MAX_RETRIES");
    assert_eq!(max.kind, SymbolKind::Constant);
    assert_eq!(max.signature, "MAX_RETRIES = 3");
    assert_eq!(max.start_line, 2);

    let user = by_name(&symbols, "User");
    assert_eq!(user.kind, SymbolKind::Class);
    assert_eq!(user.documentation, "A user record.");
    assert_eq!(user.attributes, ["@dataclass"]);
    assert_eq!(user.start_line, 5);

    let role = by_name(&symbols, "User.DEFAULT_ROLE");
    assert_eq!(role.kind, SymbolKind::Constant);
    assert_eq!(role.parent_id.as_deref(), Some("app-models.py::User"));

    let login = by_name(&symbols, "User.login");
    assert_eq!(login.kind, SymbolKind::Method);
    assert_eq!(login.id, "app-models.py::User.login");
    assert_eq!(login.signature, "def login(self, password: str) -> bool");
    assert_eq!(login.documentation, "Log the user in.\n\nChecks the password first.");
    assert!(login.keywords.contains(&"password".to_string()));
    assert!(login.keywords.contains(&"bool".to_string()));
    assert!(!login.keywords.contains(&"self".to_string()));

    let helper = by_name(&symbols, "helper");
    assert_eq!(helper.kind, SymbolKind::Function);
    assert!(helper.documentation.is_empty());
    assert!(helper.parent_id.is_none());
}

#[test]
fn test_rust_extraction() {
    let symbols = extract("rust", "src/server.rs", RUST);
    let ids: Vec<_> = symbols.iter().map(|s| s.id.as_str()).collect();
    assert_eq!(
        ids,
        [
            "src-server.rs::MAX_CONN",
            "src-server.rs::Server",
            "src-server.rs::Server~2",
            "src-server.rs::Server.new",
            "src-server.rs::Handler",
            "src-server.rs::Handler.handle",
        ]
    );

    let max = by_name(&symbols, "MAX_CONN");
    assert_eq!(max.kind, SymbolKind::Constant);
    assert_eq!(max.documentation, "Maximum connections.");

    let server = &symbols[1];
    assert_eq!(server.kind, SymbolKind::Type);
    assert_eq!(server.documentation, "A server.");
    assert_eq!(server.attributes, ["#[derive(Debug)]"]);
    assert_eq!(server.signature, "pub struct Server");

    let imp = &symbols[2];
    assert_eq!(imp.kind, SymbolKind::Class);
    assert_eq!(imp.name, "Server");

    let new = by_name(&symbols, "Server.new");
    assert_eq!(new.kind, SymbolKind::Method);
    assert_eq!(new.parent_id.as_deref(), Some("src-server.rs::Server~2"));
    assert_eq!(new.signature, "pub fn new(port: u16) -> Self");
    assert_eq!(new.documentation, "Create a server.");

    let handle = by_name(&symbols, "Handler.handle");
    assert_eq!(handle.kind, SymbolKind::Method);
    assert_eq!(handle.signature, "fn handle(&self, req: &str) -> String");

    hierarchy::validate(&symbols).unwrap();
}

#[test]
fn test_go_extraction() {
    let symbols = extract("go", "server.go", GO);
    let names: Vec<_> = symbols.iter().map(|s| s.qualified_name.as_str()).collect();
    assert_eq!(names, ["MAX_CONN", "Server", "Server.Start", "Helper"]);

    assert_eq!(by_name(&symbols, "MAX_CONN").documentation, "MAX_CONN limits connections.");

    let server = by_name(&symbols, "Server");
    assert_eq!(server.kind, SymbolKind::Type);
    assert_eq!(server.signature, "type Server struct");
    assert_eq!(server.documentation, "Server serves requests.");

    let start = by_name(&symbols, "Server.Start");
    assert_eq!(start.kind, SymbolKind::Method);
    assert_eq!(start.name, "Start");
    assert_eq!(start.signature, "func (s *Server) Start(addr string) error");
    assert_eq!(start.documentation, "Start runs the server.");
    assert!(start.parent_id.is_none());

    assert_eq!(by_name(&symbols, "Helper").signature, "func Helper()");
}

#[test]
fn test_java_extraction() {
    let symbols = extract("java", "demo/Greeter.java", JAVA);
    let names: Vec<_> = symbols.iter().map(|s| s.qualified_name.as_str()).collect();
    assert_eq!(names, ["Greeter", "Greeter.MAX_NAMES", "Greeter.greet"]);

    let class = by_name(&symbols, "Greeter");
    assert_eq!(class.kind, SymbolKind::Class);
    assert_eq!(class.documentation, "A greeter.");
    assert_eq!(class.attributes, ["@Service"]);
    assert!(class.signature.ends_with("public class Greeter"));

    let constant = by_name(&symbols, "Greeter.MAX_NAMES");
    assert_eq!(constant.kind, SymbolKind::Constant);
    assert!(constant.signature.starts_with("public static final int MAX_NAMES"));

    let greet = by_name(&symbols, "Greeter.greet");
    assert_eq!(greet.kind, SymbolKind::Method);
    assert_eq!(greet.documentation, "Says hello.");
    assert_eq!(greet.attributes, ["@Override"]);
    assert_eq!(greet.keywords, ["greet", "name", "string"]);
}

#[test]
fn test_typescript_extraction() {
    let symbols = extract("typescript", "src/client.ts", TYPESCRIPT);
    let names: Vec<_> = symbols.iter().map(|s| s.qualified_name.as_str()).collect();
    assert_eq!(names, ["MAX_RETRIES", "ApiClient", "ApiClient.fetch", "Options", "add"]);

    let max = by_name(&symbols, "MAX_RETRIES");
    assert_eq!(max.documentation, "Maximum retries.");
    assert_eq!(max.signature, "const MAX_RETRIES = 3;");

    let client = by_name(&symbols, "ApiClient");
    assert_eq!(client.documentation, "Client for the API.");
    assert_eq!(client.signature, "class ApiClient");

    let fetch = by_name(&symbols, "ApiClient.fetch");
    assert_eq!(fetch.kind, SymbolKind::Method);
    assert_eq!(fetch.signature, "fetch(url: string): Promise<string>");

    assert_eq!(by_name(&symbols, "Options").kind, SymbolKind::Type);

    let add = by_name(&symbols, "add");
    assert_eq!(add.kind, SymbolKind::Function);
    assert_eq!(add.documentation, "Adds numbers.");
    assert_eq!(add.signature, "add = (a: number, b: number): number =>");
    let source = &TYPESCRIPT.as_bytes()[add.byte_offset..add.byte_offset + add.byte_length];
    assert!(source.starts_with(b"add = "));
}

#[test]
fn test_javascript_arrow_constants_are_functions() {
    let symbols = extract("javascript", "util.js", JAVASCRIPT);
    let names: Vec<_> = symbols.iter().map(|s| s.qualified_name.as_str()).collect();
    assert_eq!(names, ["greet", "HANDLER", "Counter", "Counter.increment"]);

    assert_eq!(by_name(&symbols, "greet").documentation, "Greets someone.");
    assert_eq!(by_name(&symbols, "HANDLER").kind, SymbolKind::Function);
    assert_eq!(by_name(&symbols, "Counter.increment").kind, SymbolKind::Method);
}

#[test]
fn test_reextraction_is_stable() {
    let first = extract("rust", "src/server.rs", RUST);
    let second = extract("rust", "src/server.rs", RUST);
    assert_eq!(first, second);
}
