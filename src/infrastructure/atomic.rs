use std::ffi::OsString;
use std::fs;
use std::io;
use std::path::Path;

/// Write `contents` to `path` without a torn intermediate state: the data
/// goes to a sibling temporary file which is then renamed over the target.
pub fn write_atomic(path: &Path, contents: &str) -> io::Result<()> {
    let mut tmp_name = OsString::from(path.as_os_str());
    tmp_name.push(".tmp");
    let tmp = Path::new(&tmp_name);

    fs::write(tmp, contents)?;
    fs::rename(tmp, path)
}
