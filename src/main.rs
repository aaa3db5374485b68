/*

    Run the "create lattice" operator on a scene described in JSON
    and print what it did.

    The scene file may carry an "Operator" block with the parameters
    (Orientation, ResolutionU/V/W, Interpolation), defaults are used
    otherwise.

    @date: Oct, 2025
    @author: Bartu

*/

use std::{env, path::Path};
use tracing::{info, warn, error, debug};

use simple_lattice::operator::OPERATOR_ID;
use simple_lattice::report::CageReport;
use simple_lattice::{CommandRegistry, LatticeCreateOperator, Scene, Status};

fn main() -> Result<(), Box<dyn std::error::Error>> {

    // Logging on console
    tracing_subscriber::fmt::init();

    // Parse args
    let args: Vec<String> = env::args().collect();
    let json_path: &String = if args.len() == 1 {
        warn!("No arguments were provided, setting default scene path...");
        &String::from("./inputs/two_meshes.json")
    } else if args.len() == 2 {
        &args[1]
    } else {
        error!("Usage: {} <filename>.json", args[0]);
        std::process::exit(1);
    };

    // Parse JSON
    info!("Loading scene from {}...", json_path);
    let (mut scene, params) = Scene::load(Path::new(json_path)).map_err(|e| {
        error!("Failed to load scene: {}", e);
        Box::<dyn std::error::Error>::from(e)
    })?;
    debug!("Operator parameters: {:?}", params);

    let mut registry: CommandRegistry<Scene> = CommandRegistry::new();
    registry.register(Box::new(LatticeCreateOperator::new(params)));

    // Create the cage, then re-pose it once the way a redo would
    let mut status = registry.invoke(OPERATOR_ID, &mut scene)?;
    if status == Status::Finished {
        status = registry.execute(OPERATOR_ID, &mut scene)?;
    }

    let report = CageReport::collect(&scene, status);
    println!("{}", serde_json::to_string_pretty(&report)?);

    registry.shutdown();
    info!("Finished execution.");
    Ok(())
}
