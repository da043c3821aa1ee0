use chat_probe::{GreeterServer, ServerEvent};

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let server = GreeterServer::new("127.0.0.1:7878".to_string()).expect("Failed at creating server");

    let mut handle = match server.start() {
        Ok(handle) => handle,
        Err(e) => panic!("Error at starting server {e}"),
    };
    let events = handle.take_events().expect("Events already taken");

    for event in events {
        match event {
            ServerEvent::Connected { peer } => log::info!("{peer} connected"),
            ServerEvent::Line { peer, line } => log::info!("{peer} sent {line:?}"),
            ServerEvent::Disconnected { peer } => log::info!("{peer} disconnected"),
        }
    }
}
