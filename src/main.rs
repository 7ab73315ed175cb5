fn main() {
    std::process::exit(jenkins_launcher_lib::run());
}
