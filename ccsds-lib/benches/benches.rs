use rand::Rng;

use ccsds_decoder::{Packet, PacketDecoder, PrimaryHeader};
use criterion::{criterion_group, criterion_main, Criterion, Throughput};

// Back-to-back packets with random data fields of `len` bytes.
fn packet_stream(count: usize, len: usize) -> Vec<u8> {
    let mut rng = rand::thread_rng();
    let mut dat = Vec::with_capacity(count * (PrimaryHeader::LEN + len));
    let len_minus1 = u16::try_from(len - 1).unwrap();
    for seq in 0..count {
        let seq = (seq as u16) & PrimaryHeader::SEQ_MAX;
        dat.extend(0x0d59u16.to_be_bytes());
        dat.extend((0xc000 | seq).to_be_bytes());
        dat.extend(len_minus1.to_be_bytes());
        dat.extend((0..len).map(|_| rng.gen::<u8>()));
    }
    dat
}

fn bench_read_all_packets(c: &mut Criterion) {
    let mut group = c.benchmark_group("decode");
    for len in [16, 1024, 65536] {
        let dat = packet_stream(64, len);
        group.throughput(Throughput::Bytes(dat.len() as u64));
        group.bench_function(format!("read_all_packets/{len}"), |b| {
            b.iter(|| {
                let (packets, err) = PacketDecoder::new(&dat[..]).read_all_packets();
                assert!(err.is_none());
                assert_eq!(packets.len(), 64);
            });
        });
    }
    group.finish();
}

fn bench_decode_header(c: &mut Criterion) {
    let dat = packet_stream(1, 8);
    let mut group = c.benchmark_group("header");
    group.throughput(Throughput::Bytes(PrimaryHeader::LEN as u64));
    group.bench_function("decode", |b| {
        b.iter(|| {
            let _: Option<Packet> = Packet::decode(&dat);
        });
    });
    group.finish();
}

criterion_group!(benches, bench_read_all_packets, bench_decode_header);
criterion_main!(benches);
