fn main() -> std::process::ExitCode {
    rankwatch_lib::run()
}
