use rnaview_core::graph::{self, GraphOptions};
use rnaview_core::GraphData;

fn main() {
    let graphs = [
        (
            "hairpin",
            r#"{"nodes":[{"id":"f0","type":"fiveprime","length":2},{"id":"s0","type":"stem","length":3},
                {"id":"h0","type":"hairpin","length":3},{"id":"t0","type":"threeprime","length":1}],
               "links":[{"source":"f0","target":"s0"},{"source":"s0","target":"h0"},{"source":"s0","target":"t0"}]}"#,
        ),
        (
            "multiloop",
            r#"{"nodes":[{"id":"s0","type":"stem","length":3},{"id":"m0","type":"multiloop","length":2},
                {"id":"s1","type":"stem","length":2},{"id":"h1","type":"hairpin","length":3},
                {"id":"s2","type":"stem","length":2},{"id":"i2","type":"interior_loop","length":2},
                {"id":"s3","type":"stem","length":2},{"id":"h3","type":"hairpin","length":4}],
               "links":[{"source":"s0","target":"m0"},{"source":"m0","target":"s1"},{"source":"s1","target":"h1"},
                {"source":"m0","target":"s2"},{"source":"s2","target":"i2"},{"source":"i2","target":"s3"},
                {"source":"s3","target":"h3"}]}"#,
        ),
    ];

    let opts = GraphOptions {
        show_labels: true,
        ..GraphOptions::default()
    };

    for (name, json) in &graphs {
        let data: GraphData = serde_json::from_str(json).unwrap();
        let svg = graph::draw(&data, &opts);
        let path = format!("examples/{}.svg", name);
        std::fs::write(&path, &svg).unwrap();
        println!("wrote {} ({} bytes)", path, svg.len());
    }
}
