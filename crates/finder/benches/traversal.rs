use criterion::{black_box, criterion_group, criterion_main, Criterion};
use dom::DomService;
use frame_finder::{FrameFinder, SearchOptions};
use serde_json::{json, Value};

/// `fanout` iframes per document, `levels` deep, 20 paragraphs per document
fn nested_snapshot(fanout: usize, levels: usize) -> Value {
    fn bump(next_id: &mut u64) -> u64 {
        *next_id += 1;
        *next_id
    }

    fn document(next_id: &mut u64, fanout: usize, level: usize, levels: usize) -> Value {
        let doc_id = bump(next_id);
        let mut body: Vec<Value> = (0..20)
            .map(|i| {
                let p = bump(next_id);
                let class = if i % 5 == 0 { "note" } else { "text" };
                json!({
                    "nodeId": p, "backendNodeId": p, "nodeType": 1, "nodeName": "P",
                    "attributes": ["class", class]
                })
            })
            .collect();

        if level < levels {
            for i in 0..fanout {
                let frame_id = bump(next_id);
                let content = document(next_id, fanout, level + 1, levels);
                body.push(json!({
                    "nodeId": frame_id, "backendNodeId": frame_id, "nodeType": 1,
                    "nodeName": "IFRAME", "attributes": ["id", format!("f{}-{}", level, i)],
                    "contentDocument": content
                }));
            }
        }

        json!({
            "nodeId": doc_id, "backendNodeId": doc_id, "nodeType": 9, "nodeName": "#document",
            "documentURL": format!("https://bench.test/{}", doc_id),
            "children": body
        })
    }

    let mut next_id = 0;
    json!({ "root": document(&mut next_id, fanout, 0, levels) })
}

fn bench_traversal(c: &mut Criterion) {
    let mut service = DomService::new();
    service
        .parse_cdp_dom_tree(&nested_snapshot(4, 4))
        .expect("bench snapshot should parse");
    let finder = FrameFinder::new(service.top_document().expect("root document"));

    c.bench_function("find_iframe_by_id (deepest, last)", |b| {
        b.iter(|| finder.find_iframe_by_id(black_box("f3-3"), SearchOptions::new()))
    });

    c.bench_function("find_all_elements (.note)", |b| {
        b.iter(|| finder.find_all_elements(black_box("p.note"), SearchOptions::new()))
    });

    c.bench_function("find_element (missing)", |b| {
        b.iter(|| finder.find_element(black_box("section > p"), SearchOptions::new()))
    });
}

criterion_group!(benches, bench_traversal);
criterion_main!(benches);
