use std::path::PathBuf;

fn main() -> eframe::Result {
    // a single optional argument: the archive file to open at launch
    let path = std::env::args_os().nth(1).map(PathBuf::from);
    kasten::run_gui(path)
}
