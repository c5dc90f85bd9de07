fn main() {
    if let Err(e) = audio_splicer_lib::run() {
        eprintln!("audio-splicer: {e}");
        std::process::exit(1);
    }
}
