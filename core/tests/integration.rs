//! Full CRUD lifecycle test against a live todo server.
//!
//! # Design
//! Starts the server on a random port, then exercises every client operation
//! over real HTTP using ureq. Validates that the client's request building and
//! response parsing work end-to-end with the actual server.

use todo_core::{ApiError, CreateTodo, HttpMethod, HttpResponse, TodoClient, UpdateTodo};
use todo_server::{AppState, Config, TodoStore};

/// Execute an `HttpRequest` using ureq and return an `HttpResponse`.
///
/// Disables ureq's automatic status-code-as-error behavior so 4xx/5xx
/// responses are returned as data rather than `Err`, letting the client
/// handle status interpretation.
fn execute(req: todo_core::HttpRequest) -> HttpResponse {
    let agent = ureq::Agent::config_builder()
        .http_status_as_error(false)
        .build()
        .new_agent();

    let mut response = match (req.method, req.body) {
        (HttpMethod::Get, _) => agent.get(&req.path).call(),
        (HttpMethod::Delete, _) => agent.delete(&req.path).call(),
        (HttpMethod::Post, Some(body)) => {
            agent.post(&req.path).content_type("application/json").send(body.as_bytes())
        }
        (HttpMethod::Post, None) => agent.post(&req.path).send_empty(),
        (HttpMethod::Patch, Some(body)) => {
            agent.patch(&req.path).content_type("application/json").send(body.as_bytes())
        }
        (HttpMethod::Patch, None) => agent.patch(&req.path).send_empty(),
    }
    .expect("HTTP transport error");

    let status = response.status().as_u16();
    let body = response.body_mut().read_to_string().unwrap_or_default();

    HttpResponse {
        status,
        headers: Vec::new(),
        body,
    }
}

/// Start the server on an ephemeral port and return its API base URL.
fn start_server() -> String {
    let std_listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = std_listener.local_addr().unwrap();
    std_listener.set_nonblocking(true).unwrap();

    std::thread::spawn(move || {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        rt.block_on(async {
            let listener = tokio::net::TcpListener::from_std(std_listener).unwrap();
            let config = Config::default();
            let app = todo_server::app(AppState::new(TodoStore::memory()), &config);
            todo_server::run(listener, app, std::future::pending()).await
        })
        .unwrap();
    });

    format!("http://{addr}/api")
}

#[test]
fn crud_lifecycle() {
    let client = TodoClient::new(&start_server());

    // Step 1: hello.
    let hello = client.parse_hello(execute(client.build_hello())).unwrap();
    assert_eq!(hello, "Hi!");

    // Step 2: list — should be empty.
    let todos = client.parse_list_todos(execute(client.build_list_todos())).unwrap();
    assert!(todos.is_empty(), "expected empty list");

    // Step 3: create two todos.
    let req = client
        .build_create_todo(&CreateTodo {
            value: "buy milk".to_string(),
        })
        .unwrap();
    let milk = client.parse_create_todo(execute(req)).unwrap();
    assert_eq!(milk.order, 1);
    assert!(!milk.is_done());

    let req = client
        .build_create_todo(&CreateTodo {
            value: "walk dog".to_string(),
        })
        .unwrap();
    let dog = client.parse_create_todo(execute(req)).unwrap();
    assert_eq!(dog.order, 2);

    // Step 4: invalid create is rejected with the server's message.
    let req = client
        .build_create_todo(&CreateTodo {
            value: String::new(),
        })
        .unwrap();
    let err = client.parse_create_todo(execute(req)).unwrap_err();
    assert!(matches!(err, ApiError::BadRequest(ref m) if m.contains("empty")));

    // Step 5: list — highest order first.
    let todos = client.parse_list_todos(execute(client.build_list_todos())).unwrap();
    assert_eq!(todos, vec![dog.clone(), milk.clone()]);

    // Step 6: move milk to the top and complete it in one request.
    let update = UpdateTodo {
        order: Some(dog.order),
        done: Some(true),
        value: None,
    };
    let req = client.build_update_todo(milk.id, &update).unwrap();
    client.parse_update_todo(execute(req)).unwrap();

    let todos = client.parse_list_todos(execute(client.build_list_todos())).unwrap();
    assert_eq!(todos[0].id, milk.id);
    assert_eq!(todos[0].order, 2);
    assert!(todos[0].is_done());
    assert_eq!(todos[1].id, dog.id);
    assert_eq!(todos[1].order, 1);

    // Step 7: reopen milk.
    let update = UpdateTodo {
        done: Some(false),
        ..UpdateTodo::default()
    };
    let req = client.build_update_todo(milk.id, &update).unwrap();
    client.parse_update_todo(execute(req)).unwrap();
    let todos = client.parse_list_todos(execute(client.build_list_todos())).unwrap();
    assert!(!todos[0].is_done());

    // Step 8: delete.
    client
        .parse_delete_todo(execute(client.build_delete_todo(milk.id)))
        .unwrap();

    // Step 9: update and delete after delete — NotFound.
    let req = client.build_update_todo(milk.id, &UpdateTodo::default()).unwrap();
    let err = client.parse_update_todo(execute(req)).unwrap_err();
    assert!(matches!(err, ApiError::NotFound(_)));
    let err = client
        .parse_delete_todo(execute(client.build_delete_todo(milk.id)))
        .unwrap_err();
    assert!(matches!(err, ApiError::NotFound(_)));

    // Step 10: only the dog remains.
    let todos = client.parse_list_todos(execute(client.build_list_todos())).unwrap();
    assert_eq!(todos.len(), 1);
    assert_eq!(todos[0].id, dog.id);
}
