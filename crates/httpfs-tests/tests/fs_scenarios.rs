//! End-to-end filesystem scenarios against a deterministic server.

use std::thread;
use std::time::{Duration, Instant};

use httpfs_fs::{FsConfig, HttpFs, HttpFsDriver};
use httpfs_tests::{Response, TestServer};

const ROOT_LISTING: &str = r#"[
    {"name":"a","type":"directory","mtime":"Mon, 01 Jan 2024 00:00:00 UTC"},
    {"name":"b.txt","type":"file","size":11,"mtime":"Mon, 01 Jan 2024 00:00:00 UTC"}
]"#;

fn facade(server: &TestServer, ttl: u64) -> HttpFs {
    let mut config = FsConfig::new(server.base_url());
    config.meta_cache_ttl = ttl;
    HttpFs::new(config).expect("facade")
}

fn driver(server: &TestServer) -> HttpFsDriver {
    HttpFsDriver::new(facade(server, 60))
}

#[test]
fn test_root_listing() {
    let server = TestServer::start();
    server.route_path("/", Response::listing(ROOT_LISTING));

    let driver = driver(&server);

    let entry = driver.list_dir("/").unwrap();
    let names: Vec<_> = entry.entries.keys().cloned().collect();
    assert_eq!(names, vec!["a".to_string(), "b.txt".to_string()]);

    let dir = driver.attr_of("/a").unwrap();
    assert!(dir.is_dir());

    let file = driver.attr_of("/b.txt").unwrap();
    assert!(file.is_file());
    assert_eq!(file.size, 11);
}

#[test]
fn test_byte_range_read() {
    let server = TestServer::start();
    server.route_path("/b.txt", Response::File(b"hello world".to_vec()));

    let driver = driver(&server);
    let data = driver.read_range("/b.txt", 0, 5).unwrap();

    assert_eq!(data, b"hello");
    assert_eq!(server.requests()[0].range, Some("bytes=0-4".to_string()));
}

#[test]
fn test_short_read_at_eof() {
    let server = TestServer::start();
    server.route_path("/b.txt", Response::File(b"hello world".to_vec()));

    let driver = driver(&server);
    let data = driver.read_range("/b.txt", 6, 100).unwrap();

    assert_eq!(data, b"world");
}

#[test]
fn test_missing_name_is_enoent() {
    let server = TestServer::start();
    server.route_path("/", Response::listing("[]"));

    let driver = driver(&server);
    assert_eq!(driver.attr_of("/missing"), Err(libc::ENOENT));
}

#[test]
fn test_write_rejection_issues_no_requests() {
    let server = TestServer::start();
    let driver = driver(&server);

    assert_eq!(driver.deny_mutation("mkdir"), libc::EACCES);
    assert_eq!(driver.deny_mutation("write"), libc::EACCES);
    assert_eq!(driver.deny_mutation("unlink"), libc::EACCES);
    assert_eq!(server.request_count(), 0);
}

#[test]
fn test_root_attr_is_synthesized_without_traffic() {
    let server = TestServer::start();
    let driver = driver(&server);

    let root = driver.attr_of("/").unwrap();
    assert!(root.is_dir());
    assert_eq!(root.mtime, 0);
    assert_eq!(server.request_count(), 0);
}

#[test]
fn test_oversize_response_is_an_io_error() {
    let server = TestServer::start();
    // Raw ignores the range and serves 100 bytes regardless.
    server.route_path("/big", Response::Raw(vec![0u8; 100]));

    let driver = driver(&server);
    assert_eq!(driver.read_range("/big", 0, 10), Err(libc::EIO));
}

#[test]
fn test_transport_failure_is_an_io_error() {
    let server = TestServer::start();
    let driver = driver(&server);
    drop(server); // Every request now fails to connect.

    assert_eq!(driver.list_dir("/").err(), Some(libc::EIO));
}

#[test]
fn test_unparseable_listing_is_an_io_error() {
    let server = TestServer::start();
    server.route_path("/", Response::Raw(b"<html>autoindex off</html>".to_vec()));

    let driver = driver(&server);
    assert_eq!(driver.list_dir("/").err(), Some(libc::EIO));
}

#[test]
fn test_request_targets_are_fully_percent_encoded() {
    let server = TestServer::start();
    server.route_path("/b.txt", Response::File(b"hello world".to_vec()));

    let driver = driver(&server);
    driver.read_range("/b.txt", 0, 5).unwrap();

    // Every non-alphanumeric byte is escaped, the path separator too.
    assert_eq!(server.requests()[0].target, "/fs%2fb%2etxt");
}

#[test]
fn test_listing_is_cached_within_ttl() {
    let server = TestServer::start();
    server.route_path("/", Response::listing(ROOT_LISTING));

    let fs = facade(&server, 60);
    fs.read_dir("/").unwrap();
    fs.read_dir("/").unwrap();
    fs.read_dir("/").unwrap();

    assert_eq!(server.request_count(), 1);
}

#[test]
fn test_ttl_refresh_cycle() {
    let listing_a = r#"[{"name":"a","type":"file","size":1,"mtime":"Mon, 01 Jan 2024 00:00:00 UTC"}]"#;
    let listing_b = r#"[{"name":"b","type":"file","size":2,"mtime":"Mon, 01 Jan 2024 00:00:00 UTC"}]"#;
    let listing_c = r#"[{"name":"c","type":"file","size":3,"mtime":"Mon, 01 Jan 2024 00:00:00 UTC"}]"#;

    let server = TestServer::start();
    server.route_path("/", Response::listing(listing_a));

    let fs = facade(&server, 6);

    // Fill the cache.
    let entry = fs.read_dir("/").unwrap();
    assert!(entry.entries.contains_key("a"));
    assert_eq!(server.request_count(), 1);

    // The server moves on while the cache still holds the old listing.
    server.route_path("/", Response::listing(listing_b));

    // Second half of the TTL window: the cached listing is served, and
    // one background refresh is scheduled.
    thread::sleep(Duration::from_secs(4));
    let entry = fs.read_dir("/").unwrap();
    assert!(entry.entries.contains_key("a"));

    let deadline = Instant::now() + Duration::from_secs(3);
    while server.request_count() < 2 && Instant::now() < deadline {
        thread::sleep(Duration::from_millis(20));
    }
    assert_eq!(server.request_count(), 2);

    // The refresh landed: the cache now answers with the new listing,
    // without further traffic.
    thread::sleep(Duration::from_millis(200));
    let entry = fs.read_dir("/").unwrap();
    assert!(entry.entries.contains_key("b"));
    assert_eq!(server.request_count(), 2);

    // Past the TTL the entry expires and the next call fetches
    // synchronously.
    server.route_path("/", Response::listing(listing_c));
    thread::sleep(Duration::from_secs(8));
    let entry = fs.read_dir("/").unwrap();
    assert!(entry.entries.contains_key("c"));
    assert_eq!(server.request_count(), 3);
}
