use fpc1020a::{Config, Error, Fpc1020a, Permission, SerialTransport};
use serialport::{available_ports, open_with_settings, SerialPortSettings};
use std::{cell::RefCell, env, thread, time::Duration};

mod pc_utils;
use pc_utils::{SerialReader, SerialWriter, StdClock};

fn main() {
    let args: Vec<String> = env::args().collect();
    match args.len() {
        1 => print_ports(),
        2 => run(args[1].as_str(), 1),
        3 => run(args[1].as_str(), args[2].parse::<u8>().unwrap()),
        _ => panic!("Usage: pc_fingerprint [port_name] [user_id]"),
    };
}

fn print_ports() {
    let ports = available_ports().unwrap();
    for port in ports {
        println!("Available port: {} ({:#?})", port.port_name, port.port_type);
    }
}

fn run(port_name: &str, user_id: u8) {
    println!("Using port {}", port_name);
    let config = Config::default();
    let settings = SerialPortSettings {
        baud_rate: config.baud_rate,
        timeout: Duration::from_millis(1),
        ..SerialPortSettings::default()
    };
    let port = open_with_settings(port_name, &settings).unwrap();
    let port_cell = RefCell::new(port);

    let transport = SerialTransport::new(
        SerialWriter(&port_cell),
        SerialReader(&port_cell),
        StdClock::new(),
    );
    let mut sensor = match Fpc1020a::new(transport, config) {
        Ok(sensor) => sensor,
        Err(e) => panic!("Error: {}", e),
    };

    println!("1. Deleting all users");
    match sensor.delete_all_users() {
        Ok(()) => println!("Deleted, {} users left", sensor.user_count_or_sentinel()),
        Err(e) => println!("Failed to delete all users: {}", e),
    };

    println!("2. Enrolling user {} - place the same finger three times", user_id);
    match sensor.add_user(user_id, Permission::Guest) {
        Ok(()) => println!("Saved user {}", user_id),
        Err(e) => println!("Failed to save user: {}", e),
    };

    println!("3. Matching - Ctrl-C to stop");
    loop {
        match sensor.compare_finger() {
            Ok(found) => println!("Found user {} ({:?})", found.user_id, found.permission),
            Err(Error::NoUser) => println!("User not found"),
            Err(Error::Timeout) => println!("No finger on the sensor"),
            Err(e) => println!("Error: {}", e),
        }
        thread::sleep(Duration::from_secs(1));
    }
}
