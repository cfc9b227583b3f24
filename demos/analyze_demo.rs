use gcode_analyzer::report::TextReport;
use gcode_analyzer::{analyze, project, AnalysisConfig, BoundingBox3D, MachineRegistry};

fn main() {
    println!("=== G-code Analysis Demo ===");

    let program = "\
; gcode_machine=tormach-1100mx
G21 G90 G54
S11000 M3
G0 Z2
G0 X-5 Y0
G1 Z-1 F250
G1 X40 F6000
G1 Y20
G0 Z10
M5
M30
";

    let registry = MachineRegistry::with_builtin_profiles();
    let machine = registry.resolve_for(program);

    let mut config = AnalysisConfig {
        stock_bounds_mm: Some(BoundingBox3D::from_stock_dimensions(50.0, 30.0, 5.0)),
        ..Default::default()
    };
    if let Some(machine) = machine {
        machine.apply(&mut config);
    }

    match analyze(program, &config) {
        Ok(result) => {
            print!(
                "{}",
                TextReport {
                    file: "demo.nc",
                    machine: machine.map(|m| m.name.as_str()),
                    result: &result,
                }
            );

            println!("\nToolpath preview segments:");
            for segment in &result.projection {
                println!(
                    "  line {:>2} {:5} ({:6.2}, {:6.2}) -> ({:6.2}, {:6.2})",
                    segment.line,
                    if segment.rapid { "rapid" } else { "cut" },
                    segment.x0,
                    segment.y0,
                    segment.x1,
                    segment.y1
                );
            }
        }
        Err(e) => println!("Analysis failed: {}", e),
    }

    // The projection is also available lazily from a simulation trace
    let trace = gcode_analyzer::machine::simulate(
        &gcode_analyzer::parse_program(program),
        config.default_units,
    );
    println!("\nCut segments: {}", project(&trace.events).filter(|s| !s.rapid).count());
}
