use kwondo::config::GameConfig;
use kwondo::simulation::{run_simulation, SimInput, SimulationRequest};
use kwondo::tilemap::Tilemap;

fn main() {
    let config = GameConfig::load_or_default();
    let tilemap = Tilemap::load_or_demo();
    let request = load_request();

    eprintln!(
        "[kwondo] Running headless simulation: {} frames, {} scripted inputs",
        request.max_frames,
        request.inputs.len()
    );
    let result = run_simulation(config, tilemap, &request);
    eprintln!(
        "[kwondo] Outcome: {} after {} frames ({} events)",
        result.outcome,
        result.frames_elapsed,
        result.events.len()
    );

    match serde_json::to_string_pretty(&result) {
        Ok(json) => println!("{}", json),
        Err(e) => {
            eprintln!("[kwondo] Failed to serialize result: {}", e);
            std::process::exit(1);
        }
    }
}

/// Load a scripted run from `KWONDO_SCRIPT`, falling back to a demo script
/// that walks right, clears the spike pit and trades hits with the patrols.
fn load_request() -> SimulationRequest {
    if let Some(path) = std::env::var("KWONDO_SCRIPT").ok().filter(|s| !s.is_empty()) {
        match std::fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str::<SimulationRequest>(&contents) {
                Ok(request) => {
                    eprintln!("[kwondo] Loaded script from {}", path);
                    return request;
                }
                Err(e) => eprintln!("[kwondo] Failed to parse {}: {}", path, e),
            },
            Err(e) => eprintln!("[kwondo] Failed to read {}: {}", path, e),
        }
    }
    demo_request()
}

fn demo_request() -> SimulationRequest {
    let held = |frame: u32, action: &str, duration: u32| SimInput {
        frame,
        action: action.to_string(),
        duration,
    };
    SimulationRequest {
        inputs: vec![
            held(10, "right", 700),
            held(40, "jump", 10),
            held(120, "jump", 12),
            held(140, "jump", 10),
            held(200, "punch", 1),
            held(230, "punch", 1),
            held(260, "kick", 1),
            held(320, "jump", 12),
            held(430, "punch", 1),
            held(460, "kick", 1),
            held(520, "jump", 12),
        ],
        max_frames: 900,
        record_interval: 15,
    }
}
