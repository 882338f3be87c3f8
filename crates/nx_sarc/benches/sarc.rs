use divan::AllocProfiler;

#[global_allocator]
static ALLOC: AllocProfiler = AllocProfiler::system();

fn main() {
    divan::main();
}

fn get_writer() -> nx_sarc::SarcWriter {
    use nx_sarc::{alignment::AlignmentPolicy, write::SarcWriterOptions, SarcWriter};

    let mut sarc = SarcWriter::new(
        SarcWriterOptions::builder()
            .alignment(AlignmentPolicy::new(4).with("bfres", 0x2000).with("byml", 8))
            .build(),
    );
    for i in 0..512u32 {
        let ext = match i % 3 {
            0 => "bfres",
            1 => "byml",
            _ => "txt",
        };
        sarc.add_file(
            format!("Actor/Pack/Object_{:04}.{}", i, ext),
            vec![(i & 0xFF) as u8; (i as usize * 7) % 300 + 1],
        );
    }
    sarc
}

pub mod read {
    use divan::Bencher;
    use nx_sarc::SarcArchive;

    fn get_input() -> Vec<u8> {
        super::get_writer().build().unwrap()
    }

    #[divan::bench]
    fn open(bencher: Bencher) {
        bencher.with_inputs(get_input).bench_refs(|data| {
            divan::black_box(SarcArchive::new(data).unwrap());
        });
    }

    #[divan::bench]
    fn lookup_by_name(bencher: Bencher) {
        let data = get_input();
        let sarc = SarcArchive::new(&data).unwrap();
        bencher.bench_local(|| {
            divan::black_box(sarc.by_name("Actor/Pack/Object_0257.bfres").unwrap());
        });
    }

    #[divan::bench(sample_count = 10)]
    fn read_file_all(bencher: Bencher) {
        let data = get_input();
        let sarc = SarcArchive::new(&data).unwrap();
        bencher.bench_local(|| {
            let total: usize = sarc.files().map(|f| divan::black_box(f.data()).len()).sum();
            divan::black_box(total);
        });
    }
}

pub mod write {
    use divan::Bencher;

    #[divan::bench(sample_count = 10)]
    fn build(bencher: Bencher) {
        bencher.with_inputs(super::get_writer).bench_refs(|sarc| {
            divan::black_box(sarc.build().unwrap());
        });
    }
}
