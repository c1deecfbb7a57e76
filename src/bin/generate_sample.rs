use std::fmt::Write as _;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};

const OUTPUT_DIR: &str = "sample_data";

const HEADER: &str = "Cruise\tStation\tType\tyyyy-mm-ddThh:mm:ss.sss\tLongitude [degrees_east]\t\
Latitude [degrees_north]\tBot. Depth [m]\tDepth [m]\tQV:SEADATANET\tChlorophyll A [ug/l]\tQV:SEADATANET";

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5))
            .rotate_left(7)
            .wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    fn range(&mut self, lo: f64, hi: f64) -> f64 {
        lo + (hi - lo) * self.next_f64()
    }

    fn chance(&mut self, p: f64) -> bool {
        self.next_f64() < p
    }
}

/// One row of an ODV export; `None` cells are written empty.
struct Row {
    time: Option<String>,
    lon: Option<f64>,
    lat: Option<f64>,
    bot_depth: Option<f64>,
    depth: f64,
    chl: f64,
    chl_quality: u8,
}

fn decimal(v: f64, comma: bool) -> String {
    let s = format!("{v:.3}");
    if comma {
        s.replace('.', ",")
    } else {
        s
    }
}

fn render(cruise: &str, station: &str, rows: &[Row], comma: bool) -> String {
    let mut out = String::from("//ODV Spreadsheet V4.0\n//<DataType>Profiles</DataType>\n");
    out.push_str(HEADER);
    out.push('\n');
    for (i, row) in rows.iter().enumerate() {
        let (c, s, t) = if i == 0 { (cruise, station, "B") } else { ("", "", "") };
        let opt = |v: Option<f64>| v.map(|v| decimal(v, comma)).unwrap_or_default();
        let _ = writeln!(
            out,
            "{c}\t{s}\t{t}\t{}\t{}\t{}\t{}\t{}\t1\t{}\t{}",
            row.time.clone().unwrap_or_default(),
            opt(row.lon),
            opt(row.lat),
            opt(row.bot_depth),
            decimal(row.depth, comma),
            decimal(row.chl, comma),
            row.chl_quality,
        );
    }
    out
}

/// Bottle profile: position and time only on the first row, several depths.
fn profile(rng: &mut SimpleRng, day: u32) -> Vec<Row> {
    let lon = rng.range(10.0, 20.0);
    let lat = rng.range(54.0, 60.0);
    let bottom = rng.range(40.0, 120.0);
    let depths = [1.0, 5.0, 10.0, 20.0, 30.0];
    depths
        .iter()
        .enumerate()
        .map(|(i, &depth)| Row {
            time: (i == 0).then(|| format!("2019-06-{day:02}T{:02}:00:00.000", 6 + day % 12)),
            lon: (i == 0).then_some(lon),
            lat: (i == 0).then_some(lat),
            bot_depth: (i == 0).then_some(bottom),
            depth,
            chl: rng.range(0.5, 4.0) / (1.0 + depth / 20.0),
            chl_quality: if rng.chance(0.1) { 4 } else { 1 },
        })
        .collect()
}

/// Flow-through track sampled slower than the file's row rate.
fn track(rng: &mut SimpleRng, day: u32) -> Vec<Row> {
    let mut lon = rng.range(10.0, 20.0);
    let lat = rng.range(54.0, 60.0);
    let mut chl = rng.range(0.5, 3.0);
    (0..24)
        .map(|i| {
            lon += 0.01;
            if i % 4 == 0 {
                chl = rng.range(0.5, 3.0);
            }
            Row {
                time: Some(format!("2019-07-{day:02}T12:{:02}:00", i * 2)),
                lon: Some(lon),
                lat: Some(lat),
                bot_depth: None,
                depth: 3.0,
                chl: if rng.chance(0.05) { -9.0 } else { chl },
                chl_quality: if rng.chance(0.05) { 3 } else { 1 },
            }
        })
        .collect()
}

fn write_file(dir: &Path, name: &str, contents: &str) -> Result<()> {
    fs::write(dir.join(name), contents).with_context(|| format!("writing {name}"))
}

fn main() -> Result<()> {
    let mut rng = SimpleRng::new(42);
    let dir = Path::new(OUTPUT_DIR);
    fs::create_dir_all(dir).context("creating output directory")?;

    let mut list = String::from("# generated sample file list\n[ROOT]\n");
    list.push_str(OUTPUT_DIR);
    list.push('\n');

    list.push_str("[QUALITY:3]\n[FILEMARK:bottle]\n[WHITELIST]\n");
    for day in 1..=6 {
        let name = format!("profile_{day:02}.txt");
        let rows = profile(&mut rng, day);
        write_file(dir, &name, &render("SAMPLE19", &format!("P{day}"), &rows, day % 2 == 0))?;
        list.push_str(&name);
        list.push('\n');
    }

    list.push_str("[QUALITY:2]\n[FILEMARK:ferrybox]\n");
    for day in 1..=3 {
        let name = format!("track_{day:02}.txt");
        let rows = track(&mut rng, day);
        write_file(dir, &name, &render("FERRY19", &format!("T{day}"), &rows, false))?;
        list.push_str(&name);
        list.push('\n');
    }

    list.push_str("[SELECT:FIRST]\n");
    let rows = profile(&mut rng, 28);
    write_file(dir, "surface_only.txt", &render("SAMPLE19", "S1", &rows, false))?;
    list.push_str("surface_only.txt\n");

    fs::write("filelist.txt", &list).context("writing filelist.txt")?;
    println!("Wrote 10 sample files to {OUTPUT_DIR}/ and filelist.txt");
    Ok(())
}
