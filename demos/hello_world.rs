use std::io::SeekFrom;

use kvfs_kit::{OpenDispatch, OpenMode, OpenedFile, SqliteStore, VirtualFile};

fn main() {
    let tmp = std::env::temp_dir();
    println!("Temp dir: {}", tmp.display());

    // one SQLite database holds every record, keyed by path
    let store = SqliteStore::open(tmp.join("kvfs_hello.db")).unwrap();

    // write a couple of virtual files; nothing hits the store until close
    let mut f = VirtualFile::open(&store, "docs/first.txt", OpenMode::parse("w").unwrap(), None)
        .unwrap();
    f.write_text("Hello\n").unwrap();
    f.close().unwrap();

    VirtualFile::with(
        &store,
        "second.txt",
        OpenMode::parse("w").unwrap(),
        None,
        |f| f.write_text("World\n").map(|_| ()),
    )
    .unwrap();

    // read the first one back, line by line
    let mut f = VirtualFile::open(&store, "docs/first.txt", OpenMode::parse("r").unwrap(), None)
        .unwrap();
    for line in f.text_lines().unwrap() {
        print!("first.txt: {}", line.unwrap());
    }
    f.close().unwrap();

    // update in place: overwrite the first five bytes of the second file
    let mut f = VirtualFile::open(&store, "second.txt", OpenMode::parse("r+").unwrap(), None)
        .unwrap();
    f.seek(SeekFrom::Start(0)).unwrap();
    f.write_text("Earth").unwrap();
    f.close().unwrap();

    // routing: relative paths stay virtual, everything else falls through
    // to the host filesystem
    let dispatch = OpenDispatch::new(&tmp).unwrap();
    match dispatch.open(&store, "second.txt", "r", None).unwrap() {
        OpenedFile::Virtual(mut f) => {
            println!("second.txt: {}", f.read_text(None).unwrap().trim_end());
            f.close().unwrap();
        }
        OpenedFile::Host(_) => unreachable!("relative paths are virtual"),
    }
}
