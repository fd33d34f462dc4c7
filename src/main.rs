fn main() {
    eyecare_lib::run()
}
