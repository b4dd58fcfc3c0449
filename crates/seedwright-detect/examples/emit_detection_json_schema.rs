use schemars::schema_for;
use seedwright_detect::UnifiedDetectionResult;

fn main() {
    let schema = schema_for!(UnifiedDetectionResult);
    let json = serde_json::to_string_pretty(&schema).expect("serialize json schema");
    println!("{json}");
}
