fn main() {
    notehub_client_lib::run()
}
