use mstgraph::config::{LfServerConfig, ServerConfig};
use mstgraph::lf_server;
use mstgraph::shutdown::ShutdownCoordinator;
use std::io::{BufRead, BufReader, Write};
use std::net::TcpStream;
use std::time::Duration;

fn spawn_server(port: u16) -> ShutdownCoordinator {
    let shutdown = ShutdownCoordinator::manual();
    let config = LfServerConfig {
        server: ServerConfig { port, backlog: 10 },
        pool_size: 2,
        select_timeout_secs: 1,
    };
    let server_shutdown = shutdown.clone();
    std::thread::spawn(move || {
        lf_server::run(config, server_shutdown).unwrap();
    });
    std::thread::sleep(Duration::from_millis(150));
    shutdown
}

#[test]
fn end_to_end_scenario_matches_the_documented_session() {
    let shutdown = spawn_server(43150);
    let mut stream = TcpStream::connect(("127.0.0.1", 43150)).unwrap();
    let mut reader = BufReader::new(stream.try_clone().unwrap());

    stream
        .write_all(b"Newgraph 4 4\n1 2 1\n1 3 4\n2 3 2\n3 4 3\n")
        .unwrap();
    let mut created = String::new();
    reader.read_line(&mut created).unwrap();
    assert_eq!(
        created.trim_end(),
        "Graph created with 4 vertices and 4 edges."
    );

    stream.write_all(b"Kruskal\n").unwrap();
    let mut mst_reply = String::new();
    reader.read_line(&mut mst_reply).unwrap();
    assert!(mst_reply.contains("Total weight: 6"));

    stream.write_all(b"Exit\n").unwrap();
    let mut exit_reply = String::new();
    reader.read_line(&mut exit_reply).unwrap();
    assert_eq!(exit_reply.trim_end(), "Goodbye");

    shutdown.trigger();
}

#[test]
fn two_concurrent_clients_get_independent_sessions() {
    let shutdown = spawn_server(43151);

    let mut a = TcpStream::connect(("127.0.0.1", 43151)).unwrap();
    let mut a_reader = BufReader::new(a.try_clone().unwrap());
    let mut b = TcpStream::connect(("127.0.0.1", 43151)).unwrap();
    let mut b_reader = BufReader::new(b.try_clone().unwrap());

    a.write_all(b"Newgraph 2 1\n1 2 9\n").unwrap();
    let mut a_reply = String::new();
    a_reader.read_line(&mut a_reply).unwrap();
    assert_eq!(a_reply.trim_end(), "Graph created with 2 vertices and 1 edges.");

    b.write_all(b"Prim\n").unwrap();
    let mut b_reply = String::new();
    b_reader.read_line(&mut b_reply).unwrap();
    assert_eq!(b_reply.trim_end(), "Graph not initialized");

    shutdown.trigger();
}
