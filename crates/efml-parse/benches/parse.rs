use std::hint::black_box;

use codspeed_criterion_compat::{
    BenchmarkId, Criterion, Throughput, criterion_group, criterion_main,
};

fn benchmark_parser(c: &mut Criterion) {
    let inputs = [
        (
            "Simple",
            r#">div
  .hello
"#,
        ),
        (
            "Medium",
            r#">div.container.{{theme}}#root
  #id = main
  %title = {{page.title = Untitled}}
  @click.ctrl.prevent = open : {{item}}
  >ul
    +items
  >p
    .Hello {{user.name}}, welcome back
    |and this line continues
  -footer
"#,
        ),
    ];

    let mut group = c.benchmark_group("Parser Benchmark");

    for (name, code) in inputs {
        group.throughput(Throughput::Bytes(code.len() as u64));
        group.bench_with_input(BenchmarkId::new("parse_code", name), code, |b, code| {
            b.iter(|| {
                let file = efml_parse::parse(code);
                black_box(file);
            });
        });
    }

    group.finish();
}

criterion_group!(benches, benchmark_parser);
criterion_main!(benches);
