use criterion::criterion_main;


criterion_main!(chunk_list::benches, round_trip::benches);
